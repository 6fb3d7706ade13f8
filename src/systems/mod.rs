mod animation;
mod autotile;
mod economy;
mod interaction;

pub use animation::AnimationSystem;
pub use autotile::AutotileSystem;
pub use economy::{settle_cycles, EconomySystem};
pub use interaction::InteractionSystem;
