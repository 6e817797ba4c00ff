pub mod bars;
pub mod card;
pub mod money;
pub mod toast;
