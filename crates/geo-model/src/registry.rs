//! The camera registry: an ordered, immutable camera table plus the
//! mapping from camera id to the provider's stream identifier.
//!
//! Cameras without a stream identifier are valid; they are drawn on the
//! map but never scored.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraId, Category, CategoryFilter};
use crate::view::MAX_MERCATOR_LAT;

/// Errors raised while loading or validating a registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate camera id {0}")]
    DuplicateId(CameraId),

    #[error("camera {id} has invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates { id: CameraId, lat: f64, lng: f64 },

    #[error("stream mapping references unknown camera {0}")]
    UnknownStreamCamera(CameraId),

    #[error("empty stream identifier for camera {0}")]
    EmptyStreamId(CameraId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// On-disk registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryFile {
    pub cameras: Vec<Camera>,
    #[serde(default)]
    pub streams: BTreeMap<CameraId, String>,
}

/// Validated registry.
#[derive(Debug, Clone)]
pub struct CameraRegistry {
    cameras: Vec<Camera>,
    streams: BTreeMap<CameraId, String>,
}

impl CameraRegistry {
    /// Build and validate a registry.
    pub fn new(
        cameras: Vec<Camera>,
        streams: BTreeMap<CameraId, String>,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(cameras.len());
        for cam in &cameras {
            if !seen.insert(cam.id) {
                return Err(RegistryError::DuplicateId(cam.id));
            }
            let coords_ok = cam.lat.is_finite()
                && cam.lng.is_finite()
                && cam.lat.abs() <= MAX_MERCATOR_LAT
                && cam.lng.abs() <= 180.0;
            if !coords_ok {
                return Err(RegistryError::InvalidCoordinates {
                    id: cam.id,
                    lat: cam.lat,
                    lng: cam.lng,
                });
            }
        }
        for (id, stream) in &streams {
            if !seen.contains(id) {
                return Err(RegistryError::UnknownStreamCamera(*id));
            }
            if stream.trim().is_empty() {
                return Err(RegistryError::EmptyStreamId(*id));
            }
        }
        Ok(Self { cameras, streams })
    }

    /// Parse a registry JSON document.
    pub fn from_json(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(content)?;
        Self::new(file.cameras, file.streams)
    }

    /// Load a registry JSON file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The built-in Konya camera table.
    pub fn builtin() -> Self {
        let cameras = BUILTIN_CAMERAS
            .iter()
            .map(|&(id, name, lat, lng, category)| Camera::new(id, name, lat, lng, category))
            .collect();
        let streams = BUILTIN_STREAMS
            .iter()
            .map(|&(id, stream)| (id, stream.to_string()))
            .collect();
        Self { cameras, streams }
    }

    /// Cameras in registry order.
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    pub fn get(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.id == id)
    }

    /// Stream identifier for a camera, if it has one.
    pub fn stream_id(&self, id: CameraId) -> Option<&str> {
        self.streams.get(&id).map(String::as_str)
    }

    /// Cameras passing the category filter, in registry order.
    pub fn visible(&self, filter: &CategoryFilter) -> Vec<Camera> {
        self.cameras
            .iter()
            .filter(|c| filter.passes(c))
            .cloned()
            .collect()
    }

    /// Case-insensitive name search combined with the category filter.
    pub fn search(&self, query: &str, filter: &CategoryFilter) -> Vec<&Camera> {
        let needle = query.trim().to_lowercase();
        self.cameras
            .iter()
            .filter(|c| filter.passes(c))
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Serialize back to the on-disk document.
    pub fn to_file(&self) -> RegistryFile {
        RegistryFile {
            cameras: self.cameras.clone(),
            streams: self.streams.clone(),
        }
    }
}

const BUILTIN_CAMERAS: &[(CameraId, &str, f64, f64, Category)] = &[
    (36, "Hayvan Bakım Evi 1", 37.8746, 32.4932, Category::Park),
    (37, "Hayvan Bakım Evi 2", 37.8748, 32.4928, Category::Park),
    (38, "Hayvan Bakım Evi 3", 37.8750, 32.4935, Category::Park),
    (39, "Hayvan Bakım Evi 4", 37.8752, 32.4930, Category::Park),
    (43, "Millet Bahçesi", 37.8685, 32.4810, Category::Park),
    (42, "Zafer Yürüyüş Yolu", 37.8719, 32.4845, Category::Square),
    (41, "Alaeddin Keykubad Camii", 37.8745, 32.4893, Category::Historic),
    (40, "Türbe Önü", 37.8710, 32.4978, Category::Historic),
    (2, "Kılıçarslan Şehir Meydanı", 37.8733, 32.4950, Category::Square),
    (7, "Kayalıpark", 37.8673, 32.4870, Category::Park),
    (11, "Kültürpark", 37.8660, 32.4915, Category::Park),
    (20, "Zafer Meydanı Havuz", 37.8722, 32.4860, Category::Square),
    (26, "İstiklal Harbi Şehitleri Abidesi", 37.8695, 32.4960, Category::Historic),
    (27, "Mevlana Kültür Merkezi", 37.8705, 32.4958, Category::Historic),
    (31, "Şerafettin Camii", 37.8725, 32.4885, Category::Historic),
    (32, "Mevlana Meydanı", 37.8708, 32.4942, Category::Historic),
    (35, "Konya Büyükşehir Stadyumu", 37.8550, 32.4685, Category::Sports),
];

const BUILTIN_STREAMS: &[(CameraId, &str)] = &[
    (2, "co8041hpkpqs73c116hg"),
    (7, "c77i687bb2nj4i0fr7r0"),
    (11, "c77i6hb84cnrb6mlji3g"),
    (20, "c77ia4vbb2nj4i0fr85g"),
    (26, "c77ia8vbb2nj4i0fr86g"),
    (27, "c77i79j84cnrb6mlji70"),
    (31, "c77i7dr84cnrb6mlji80"),
    (32, "cei9bavbb2nv2u3dv3k0"),
    (35, "c77i9nfbb2nj4i0fr83g"),
    (36, "cg3k53okj84dao8vt0ug"),
    (37, "cg3k64gkj84dao8vt10g"),
    (38, "cg8mckokj84dao9014sg"),
    (39, "cg8mdd0kj84dao9014v0"),
    (40, "cei99afmm25sdv36p59g"),
    (41, "cei99ifmm25sdv36p5ag"),
    (42, "cei9a1fmm25sdv36p5d0"),
    (43, "cei99ovmm25sdv36p5c0"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let builtin = CameraRegistry::builtin();
        let rebuilt = CameraRegistry::new(builtin.cameras.clone(), builtin.streams.clone());
        assert!(rebuilt.is_ok());
        assert_eq!(builtin.len(), 17);
        assert_eq!(builtin.stream_id(2), Some("co8041hpkpqs73c116hg"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let cams = vec![
            Camera::new(1, "A", 37.0, 32.0, Category::Park),
            Camera::new(1, "B", 37.1, 32.1, Category::Park),
        ];
        let err = CameraRegistry::new(cams, BTreeMap::new()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId(1)));
    }

    #[test]
    fn test_stream_for_unknown_camera_rejected() {
        let cams = vec![Camera::new(1, "A", 37.0, 32.0, Category::Park)];
        let mut streams = BTreeMap::new();
        streams.insert(9, "abc".to_string());
        let err = CameraRegistry::new(cams, streams).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownStreamCamera(9)));
    }

    #[test]
    fn test_camera_without_stream_is_valid() {
        let registry = CameraRegistry::from_json(
            r#"{"cameras":[{"id":5,"name":"Quiet","lat":37.8,"lng":32.4,"category":"sports"}]}"#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.stream_id(5).is_none());
    }

    #[test]
    fn test_stream_keys_parse_from_json() {
        let registry = CameraRegistry::from_json(
            r#"{"cameras":[{"id":5,"name":"A","lat":37.8,"lng":32.4,"cat":"park"}],
                "streams":{"5":"xyz"}}"#,
        )
        .unwrap();
        assert_eq!(registry.stream_id(5), Some("xyz"));
    }

    #[test]
    fn test_search_respects_filter_and_case() {
        let registry = CameraRegistry::builtin();
        let hits = registry.search("mevlana", &CategoryFilter::all());
        assert_eq!(hits.len(), 2);
        let hits = registry.search("MEVLANA", &CategoryFilter::only(&[Category::Park]));
        assert!(hits.is_empty());
        let all = registry.search("", &CategoryFilter::all());
        assert_eq!(all.len(), registry.len());
    }

    #[test]
    fn test_invalid_latitude_rejected() {
        let cams = vec![Camera::new(1, "Pole", 89.9, 0.0, Category::Park)];
        assert!(CameraRegistry::new(cams, BTreeMap::new()).is_err());
    }
}
