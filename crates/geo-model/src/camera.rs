//! Camera records and categories.

use serde::{Deserialize, Serialize};

/// Unique camera identifier as assigned by the registry.
pub type CameraId = u32;

/// A fixed city camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: CameraId,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(alias = "cat")]
    pub category: Category,
}

impl Camera {
    pub fn new(
        id: CameraId,
        name: impl Into<String>,
        lat: f64,
        lng: f64,
        category: Category,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            lat,
            lng,
            category,
        }
    }

    /// Planar distance in degrees, used for the network connectors.
    pub fn degree_distance(&self, other: &Camera) -> f64 {
        ((self.lat - other.lat).powi(2) + (self.lng - other.lng).powi(2)).sqrt()
    }
}

/// The closed set of camera categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Park,
    Historic,
    Square,
    Sports,
}

/// Marker shape drawn for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Diamond,
    Square,
    Triangle,
}

impl Category {
    /// All categories in legend order.
    pub const ALL: [Category; 4] = [
        Category::Park,
        Category::Historic,
        Category::Square,
        Category::Sports,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Park => "Park & Nature",
            Category::Historic => "Historic & Cultural",
            Category::Square => "Square & Street",
            Category::Sports => "Sports",
        }
    }

    /// Marker shape for this category.
    pub fn shape(self) -> MarkerShape {
        match self {
            Category::Park => MarkerShape::Circle,
            Category::Historic => MarkerShape::Diamond,
            Category::Square => MarkerShape::Square,
            Category::Sports => MarkerShape::Triangle,
        }
    }

    /// Stable bit index used by category filters.
    pub fn bit(self) -> u8 {
        match self {
            Category::Park => 0b0001,
            Category::Historic => 0b0010,
            Category::Square => 0b0100,
            Category::Sports => 0b1000,
        }
    }

    /// Parse the short names used in registry files and on the command line.
    pub fn parse(name: &str) -> Option<Category> {
        match name.trim().to_ascii_lowercase().as_str() {
            "park" => Some(Category::Park),
            "historic" => Some(Category::Historic),
            "square" => Some(Category::Square),
            "sports" => Some(Category::Sports),
            _ => None,
        }
    }
}

/// Which categories are currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryFilter {
    bits: u8,
}

impl CategoryFilter {
    /// Every category visible.
    pub fn all() -> Self {
        Self { bits: 0b1111 }
    }

    /// No category visible.
    pub fn none() -> Self {
        Self { bits: 0 }
    }

    pub fn only(categories: &[Category]) -> Self {
        Self {
            bits: categories.iter().fold(0, |acc, c| acc | c.bit()),
        }
    }

    pub fn contains(&self, category: Category) -> bool {
        self.bits & category.bit() != 0
    }

    pub fn toggle(&mut self, category: Category) {
        self.bits ^= category.bit();
    }

    pub fn passes(&self, camera: &Camera) -> bool {
        self.contains(camera.category)
    }
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_shapes_are_distinct() {
        let shapes: Vec<MarkerShape> = Category::ALL.iter().map(|c| c.shape()).collect();
        for (i, a) in shapes.iter().enumerate() {
            for b in &shapes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Historic).unwrap();
        assert_eq!(json, "\"historic\"");
        let cam: Camera = serde_json::from_str(
            r#"{"id":1,"name":"A","lat":37.87,"lng":32.49,"cat":"park"}"#,
        )
        .unwrap();
        assert_eq!(cam.category, Category::Park);
    }

    #[test]
    fn test_filter_toggle() {
        let mut filter = CategoryFilter::all();
        let cam = Camera::new(1, "A", 0.0, 0.0, Category::Sports);
        assert!(filter.passes(&cam));
        filter.toggle(Category::Sports);
        assert!(!filter.passes(&cam));
        assert!(filter.contains(Category::Park));
        filter.toggle(Category::Sports);
        assert_eq!(filter, CategoryFilter::all());
    }

    #[test]
    fn test_parse_category() {
        assert_eq!(Category::parse(" Square "), Some(Category::Square));
        assert_eq!(Category::parse("meydan"), None);
    }
}
