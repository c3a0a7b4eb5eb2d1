pub mod error;
pub mod loading;
pub mod shop_card;

pub use error::ErrorView;
pub use loading::LoadingView;
pub use shop_card::ShopCard;
