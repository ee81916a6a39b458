use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::achievements::Rarity;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Furniture,
    Plant,
    Pet,
    Deco,
    Electronic,
    Food,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 6] = [
        ItemCategory::Furniture,
        ItemCategory::Plant,
        ItemCategory::Pet,
        ItemCategory::Deco,
        ItemCategory::Electronic,
        ItemCategory::Food,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Furniture => "furniture",
            ItemCategory::Plant => "plant",
            ItemCategory::Pet => "pet",
            ItemCategory::Deco => "deco",
            ItemCategory::Electronic => "electronic",
            ItemCategory::Food => "food",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ItemCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "category".into(),
                message: format!("unknown item category '{wanted}'"),
            })
    }
}

/// A purchasable room decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub category: ItemCategory,
    pub price: u64,
    pub rarity: Rarity,
    pub description: &'static str,
    /// Tile colour used when the room is drawn as pixels.
    pub pixel_color: &'static str,
}

#[allow(clippy::too_many_arguments)]
const fn item(
    id: &'static str,
    name: &'static str,
    emoji: &'static str,
    category: ItemCategory,
    price: u64,
    rarity: Rarity,
    description: &'static str,
    pixel_color: &'static str,
) -> ShopItem {
    ShopItem {
        id,
        name,
        emoji,
        category,
        price,
        rarity,
        description,
        pixel_color,
    }
}

use ItemCategory::{Deco, Electronic, Food, Furniture, Pet, Plant};
use Rarity::{Common, Legendary, Rare};

pub const SHOP_ITEMS: [ShopItem; 22] = [
    item("item_bed", "Cozy Bed", "🛏️", Furniture, 30, Common, "A snug bed", "#DDD6FE"),
    item("item_desk", "Study Desk", "🪑", Furniture, 25, Common, "A desk to focus at", "#C4A882"),
    item("item_bookshelf", "Little Bookshelf", "📚", Furniture, 35, Common, "Full of favourite books", "#92400E"),
    item("item_lamp", "Mood Lamp", "💡", Furniture, 20, Common, "Warm evening light", "#FDE68A"),
    item("item_rug", "Pastel Rug", "🟪", Furniture, 15, Common, "Soft underfoot", "#E9D5FF"),
    item("item_cactus", "Cactus", "🌵", Plant, 10, Common, "Never needs watering", "#86EFAC"),
    item("item_flower", "Potted Flower", "🌸", Plant, 15, Common, "Pretty pink blooms", "#FDA4AF"),
    item("item_bonsai", "Bonsai", "🌳", Plant, 40, Rare, "A stylish miniature tree", "#166534"),
    item("item_cat", "Cat", "🐱", Pet, 50, Rare, "Meow", "#FDBA74"),
    item("item_fish", "Fish Tank", "🐟", Pet, 30, Common, "Fish swimming in circles", "#67E8F9"),
    item("item_hamster", "Hamster", "🐹", Pet, 45, Rare, "Runs on its wheel all night", "#FCD34D"),
    item("item_poster", "Poster", "🖼️", Deco, 10, Common, "A favourite poster", "#60A5FA"),
    item("item_clock", "Wall Clock", "🕐", Deco, 20, Common, "Tick tock", "#F3F4F6"),
    item("item_star", "Star Lights", "⭐", Deco, 25, Common, "Twinkling star lights", "#FDE68A"),
    item("item_rainbow", "Rainbow Mobile", "🌈", Deco, 60, Rare, "A mobile in every colour", "#F472B6"),
    item("item_tv", "Retro TV", "📺", Electronic, 35, Common, "Old-school vibes", "#6B7280"),
    item("item_radio", "Radio", "📻", Electronic, 20, Common, "Music in the background", "#78716C"),
    item("item_gameboy", "Handheld Console", "🎮", Electronic, 55, Rare, "A nostalgic game machine", "#A78BFA"),
    item("item_cake", "Cake", "🍰", Food, 15, Common, "Sweet strawberry cake", "#FECDD3"),
    item("item_tea", "Cup of Tea", "🍵", Food, 10, Common, "Warm green tea", "#BBF7D0"),
    item("item_unicorn", "Unicorn", "🦄", Pet, 100, Legendary, "A legendary unicorn!", "#F0ABFC"),
    item("item_piano", "Mini Piano", "🎹", Electronic, 80, Legendary, "Beautiful melodies", "#1F2937"),
];

pub fn shop_item(id: &str) -> Option<&'static ShopItem> {
    SHOP_ITEMS.iter().find(|i| i.id == id)
}

/// Items in catalog order; `None` means every category.
pub fn items_in_category(category: Option<ItemCategory>) -> Vec<&'static ShopItem> {
    SHOP_ITEMS
        .iter()
        .filter(|i| category.map_or(true, |c| i.category == c))
        .collect()
}
