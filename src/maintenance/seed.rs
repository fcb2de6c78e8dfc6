//! Reset the menu to the two house dishes

use crate::core::DataService;
use crate::entities::MenuItem;
use anyhow::{Context, Result};

/// The dishes a fresh deployment starts with
pub fn default_menu() -> Vec<MenuItem> {
    vec![
        MenuItem {
            id: "1".to_string(),
            name: "Butter Chicken".to_string(),
            description: "Tender chicken in a rich, creamy tomato sauce with aromatic spices"
                .to_string(),
            price: 14.99,
            category: "main course".to_string(),
            image: String::new(),
            image_public_id: String::new(),
            is_vegetarian: false,
            spice_level: 2,
        },
        MenuItem {
            id: "2".to_string(),
            name: "Chicken Biryani".to_string(),
            description: "Fragrant basmati rice layered with spiced chicken and saffron"
                .to_string(),
            price: 16.99,
            category: "main course".to_string(),
            image: String::new(),
            image_public_id: String::new(),
            is_vegetarian: false,
            spice_level: 2,
        },
    ]
}

/// Delete every menu item, then insert [`default_menu`]. Returns the number inserted.
pub async fn seed_menu(menu: &dyn DataService<MenuItem>) -> Result<usize> {
    let existing = menu.list().await.context("listing menu items")?;
    for item in &existing {
        menu.delete(&item.id)
            .await
            .with_context(|| format!("deleting menu item {}", item.id))?;
    }
    tracing::info!(removed = existing.len(), "menu cleared");

    let items = default_menu();
    let count = items.len();
    for item in items {
        let id = item.id.clone();
        menu.create(item)
            .await
            .with_context(|| format!("inserting menu item {}", id))?;
    }

    tracing::info!(inserted = count, "Seeded menu items");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDataService;

    #[tokio::test]
    async fn test_seed_replaces_menu() {
        let menu = InMemoryDataService::<MenuItem>::new();
        let mut stale = default_menu().remove(0);
        stale.id = "old".to_string();
        stale.name = "Old Dish".to_string();
        menu.create(stale).await.unwrap();

        assert_eq!(seed_menu(&menu).await.unwrap(), 2);

        let names: Vec<_> = menu.list().await.unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Butter Chicken", "Chicken Biryani"]);
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let menu = InMemoryDataService::<MenuItem>::new();
        seed_menu(&menu).await.unwrap();
        seed_menu(&menu).await.unwrap();
        assert_eq!(menu.list().await.unwrap().len(), 2);
    }
}
