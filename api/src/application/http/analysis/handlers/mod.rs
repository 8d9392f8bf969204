pub mod analyze_health;
pub mod analyze_product_image;
