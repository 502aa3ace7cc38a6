pub mod memory;

pub use memory::MemoryStore;

use rowkit_core::scenario::ScenarioModel;
use rowkit_core::schema::ddl;
use rowkit_core::schema::types::SchemaModel;

/// A small shop schema in the shape `mysqldump` produces.
pub const SHOP_DDL: &str = r#"
-- Shop schema
DROP TABLE IF EXISTS `users`;
CREATE TABLE `users` (
  `id` int NOT NULL AUTO_INCREMENT,
  `name` varchar(100) NOT NULL,
  `email` varchar(255) DEFAULT NULL,
  `age` int DEFAULT NULL,
  `created_at` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP,
  PRIMARY KEY (`id`),
  UNIQUE KEY `uq_users_email` (`email`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;

CREATE TABLE `products` (
  `id` bigint unsigned NOT NULL AUTO_INCREMENT,
  `title` varchar(200) NOT NULL,
  `price` decimal(10,2) NOT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB;

CREATE TABLE `orders` (
  `id` int NOT NULL AUTO_INCREMENT,
  `user_id` int NOT NULL,
  `placed_on` date NOT NULL,
  `note` text,
  PRIMARY KEY (`id`),
  CONSTRAINT `fk_orders_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`)
) ENGINE=InnoDB;

CREATE TABLE `order_items` (
  `id` int NOT NULL AUTO_INCREMENT,
  `order_id` int NOT NULL,
  `product_id` bigint unsigned NOT NULL,
  `quantity` int NOT NULL,
  PRIMARY KEY (`id`),
  CONSTRAINT `fk_items_order` FOREIGN KEY (`order_id`) REFERENCES `orders` (`id`),
  CONSTRAINT `fk_items_product` FOREIGN KEY (`product_id`) REFERENCES `products` (`id`)
) ENGINE=InnoDB;

CREATE TABLE `audit_log` (
  `message` text,
  `logged_at` timestamp NULL DEFAULT NULL
) ENGINE=InnoDB;
"#;

/// Populates every shop table, children referencing parents.
pub const SHOP_SCENARIO: &str = r#"{
  "tables": {
    "users": { "count": 5 },
    "products": { "count": 3 },
    "orders": { "count": 12, "relations": { "user_id": "users.id" } },
    "order_items": {
      "count": 30,
      "relations": { "order_id": "orders.id", "product_id": "products.id" }
    },
    "audit_log": { "count": 4 }
  }
}"#;

/// Parse [`SHOP_DDL`].
pub fn shop_schema() -> SchemaModel {
    ddl::parse(SHOP_DDL).schema
}

/// Parse a scenario from JSON, panicking on invalid input.
pub fn scenario(json: &str) -> ScenarioModel {
    ScenarioModel::load(json).expect("fixture scenario must be valid JSON")
}

/// Parse [`SHOP_SCENARIO`].
pub fn shop_scenario() -> ScenarioModel {
    scenario(SHOP_SCENARIO)
}

/// An empty in-memory database with the shop tables and their foreign keys.
pub fn shop_store() -> MemoryStore {
    MemoryStore::from_schema(&shop_schema())
        .with_foreign_key("orders", "user_id", "users")
        .with_foreign_key("order_items", "order_id", "orders")
        .with_foreign_key("order_items", "product_id", "products")
}
