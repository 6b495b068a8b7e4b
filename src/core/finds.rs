//! Find Stores
//!
//! Ephemeral in-memory stores backing the "recent finds" and "community
//! finds" screens plus per-shoe star ratings. Nothing here persists across
//! a process restart.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use super::identify::models::{ShoeIdentification, ShoePrice};
use super::{CoreError, CoreResult};

// =============================================================================
// Recent Finds
// =============================================================================

/// One locally recorded scan
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFind {
    /// The arbitrated identification
    pub shoe: ShoeIdentification,
    /// URI of the scanned photo
    pub image_uri: String,
    /// When the scan was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Newest-first list of the user's own scans, capped in length
pub struct RecentFinds {
    finds: RwLock<Vec<RecentFind>>,
    capacity: usize,
}

impl RecentFinds {
    /// Default number of retained finds
    pub const DEFAULT_CAPACITY: usize = 5;

    /// Creates an empty store with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty store with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            finds: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Records a find at the front, dropping the oldest beyond capacity
    pub fn add(&self, shoe: ShoeIdentification, image_uri: &str) -> CoreResult<()> {
        let mut finds = self
            .finds
            .write()
            .map_err(|_| CoreError::Internal("Failed to lock recent finds".into()))?;
        finds.insert(
            0,
            RecentFind {
                shoe,
                image_uri: image_uri.to_string(),
                recorded_at: Utc::now(),
            },
        );
        finds.truncate(self.capacity);
        Ok(())
    }

    /// Returns all finds, newest first
    pub fn list(&self) -> Vec<RecentFind> {
        self.finds
            .read()
            .ok()
            .map(|finds| finds.clone())
            .unwrap_or_default()
    }

    /// Removes every find
    pub fn clear(&self) -> CoreResult<()> {
        self.finds
            .write()
            .map_err(|_| CoreError::Internal("Failed to lock recent finds".into()))?
            .clear();
        Ok(())
    }
}

impl Default for RecentFinds {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Community Finds
// =============================================================================

/// A scan shared by another user
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityFind {
    /// The arbitrated identification
    pub shoe: ShoeIdentification,
    /// URI of the shared photo
    pub image_uri: String,
    /// When the find was shared
    pub recorded_at: DateTime<Utc>,
    /// Sharing user's id
    pub user_id: String,
    /// Sharing user's display name
    pub username: String,
}

/// Newest-first list of community-shared finds, capped in length
pub struct CommunityFinds {
    finds: RwLock<Vec<CommunityFind>>,
    capacity: usize,
}

impl CommunityFinds {
    /// Default number of retained finds
    pub const DEFAULT_CAPACITY: usize = 10;

    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            finds: RwLock::new(Vec::new()),
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    /// Creates a store preloaded with the canned community entries shown
    /// before any real sharing happens
    pub fn seeded() -> Self {
        let store = Self::new();
        let now = Utc::now();

        let seeds = [
            (
                seed_shoe(
                    "Nike",
                    "Air Force 1",
                    100.0,
                    "$90-$110",
                    2021,
                    "Lifestyle",
                    &["White", "Black"],
                    "High",
                    "The Nike Air Force 1 is a classic sneaker that has been a staple in streetwear since its release in 1982.",
                    0.95,
                ),
                "assets/images/airforce1.png",
                now - Duration::days(1),
                "user1",
                "SneakerHead",
            ),
            (
                seed_shoe(
                    "Adidas",
                    "Samba",
                    80.0,
                    "$70-$90",
                    2020,
                    "Indoor Soccer",
                    &["Black", "White"],
                    "Medium",
                    "The Adidas Samba is a classic indoor soccer shoe that has become a popular casual sneaker.",
                    0.92,
                ),
                "assets/images/adidassamba.png",
                now - Duration::days(2),
                "user2",
                "ShoeCollector",
            ),
            (
                seed_shoe(
                    "Nike",
                    "Air Max 97",
                    170.0,
                    "$160-$180",
                    2022,
                    "Running",
                    &["Silver", "Red"],
                    "High",
                    "The Nike Air Max 97 features a full-length Air unit and a sleek, futuristic design inspired by Japanese bullet trains.",
                    0.94,
                ),
                "assets/images/airmax97.png",
                now - Duration::days(3),
                "user3",
                "SneakerEnthusiast",
            ),
        ];

        if let Ok(mut finds) = store.finds.write() {
            for (shoe, image_uri, recorded_at, user_id, username) in seeds {
                finds.push(CommunityFind {
                    shoe,
                    image_uri: image_uri.to_string(),
                    recorded_at,
                    user_id: user_id.to_string(),
                    username: username.to_string(),
                });
            }
        }

        store
    }

    /// Shares a find at the front, dropping the oldest beyond capacity
    pub fn add(
        &self,
        shoe: ShoeIdentification,
        image_uri: &str,
        user_id: &str,
        username: &str,
    ) -> CoreResult<()> {
        let mut finds = self
            .finds
            .write()
            .map_err(|_| CoreError::Internal("Failed to lock community finds".into()))?;
        finds.insert(
            0,
            CommunityFind {
                shoe,
                image_uri: image_uri.to_string(),
                recorded_at: Utc::now(),
                user_id: user_id.to_string(),
                username: username.to_string(),
            },
        );
        finds.truncate(self.capacity);
        Ok(())
    }

    /// Returns all finds, newest first
    pub fn list(&self) -> Vec<CommunityFind> {
        self.finds
            .read()
            .ok()
            .map(|finds| finds.clone())
            .unwrap_or_default()
    }

    /// Removes every find
    pub fn clear(&self) -> CoreResult<()> {
        self.finds
            .write()
            .map_err(|_| CoreError::Internal("Failed to lock community finds".into()))?
            .clear();
        Ok(())
    }
}

impl Default for CommunityFinds {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_shoe(
    brand: &str,
    model: &str,
    usd: f64,
    range: &str,
    release_year: i32,
    shoe_type: &str,
    colors: &[&str],
    popularity: &str,
    description: &str,
    confidence: f64,
) -> ShoeIdentification {
    ShoeIdentification {
        brand: brand.to_string(),
        model: model.to_string(),
        price: ShoePrice {
            usd,
            range: range.to_string(),
        },
        release_year,
        shoe_type: shoe_type.to_string(),
        colors: colors.iter().map(|c| c.to_string()).collect(),
        popularity: popularity.to_string(),
        description: description.to_string(),
        confidence,
        rarity: None,
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// A user's star rating for a shoe
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoeRating {
    /// Shoe identifier (brand-model-price, see `ShoeIdentification::shoe_id`)
    pub shoe_id: String,
    /// Star rating, 1-5
    pub rating: u8,
    /// When the rating was given or last changed
    pub rated_at: DateTime<Utc>,
}

/// Per-shoe star ratings with upsert semantics
pub struct Ratings {
    ratings: RwLock<Vec<ShoeRating>>,
}

impl Ratings {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            ratings: RwLock::new(Vec::new()),
        }
    }

    /// Adds or replaces the rating for a shoe
    pub fn add(&self, shoe_id: &str, rating: u8) -> CoreResult<()> {
        if !(1..=5).contains(&rating) {
            return Err(CoreError::ValidationError(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let entry = ShoeRating {
            shoe_id: shoe_id.to_string(),
            rating,
            rated_at: Utc::now(),
        };

        let mut ratings = self
            .ratings
            .write()
            .map_err(|_| CoreError::Internal("Failed to lock ratings".into()))?;
        match ratings.iter_mut().find(|r| r.shoe_id == shoe_id) {
            Some(existing) => *existing = entry,
            None => ratings.push(entry),
        }
        Ok(())
    }

    /// Returns the rating for a shoe, if any
    pub fn get(&self, shoe_id: &str) -> Option<u8> {
        self.ratings
            .read()
            .ok()
            .and_then(|ratings| {
                ratings
                    .iter()
                    .find(|r| r.shoe_id == shoe_id)
                    .map(|r| r.rating)
            })
    }

    /// Returns all ratings
    pub fn list(&self) -> Vec<ShoeRating> {
        self.ratings
            .read()
            .ok()
            .map(|ratings| ratings.clone())
            .unwrap_or_default()
    }
}

impl Default for Ratings {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
