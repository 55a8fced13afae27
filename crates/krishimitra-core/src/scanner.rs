//! Mock crop-disease detection.
//!
//! No image is analysed. The diagnosis is picked from a fixed table by a crop
//! keyword in the file name, and its confidence gets a small random jitter so
//! repeated scans look like model output.

use rand::Rng;
use tracing::debug;

use krishimitra_types::DetectionResult;

use crate::error::{Error, Result};

/// Default upload limit: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted file name suffixes, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Highest confidence ever reported.
pub const MAX_CONFIDENCE: f64 = 99.9;

/// Largest jitter applied to a base confidence, in either direction.
pub const CONFIDENCE_JITTER: f64 = 2.0;

/// One entry of the diagnosis table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseProfile {
    /// File name keyword selecting this entry; `None` for the default.
    pub keyword: Option<&'static str>,
    pub disease: &'static str,
    pub base_confidence: f64,
    pub description: &'static str,
    pub treatment: &'static str,
}

impl DiseaseProfile {
    fn to_result(self, confidence: f64) -> DetectionResult {
        DetectionResult {
            disease: self.disease.to_string(),
            confidence,
            description: self.description.to_string(),
            treatment: self.treatment.to_string(),
        }
    }
}

/// Keyword entries in match order, then the default.
pub static PROFILES: [DiseaseProfile; 4] = [
    DiseaseProfile {
        keyword: Some("rice"),
        disease: "Rice Blast",
        base_confidence: 88.3,
        description: "Rice blast is caused by the fungus Magnaporthe oryzae. It affects all above-ground parts of the rice plant and can cause lesions on leaves, stems, and panicles.",
        treatment: "Use blast-resistant rice varieties. Apply fungicides like Trifloxystrobin or Azoxystrobin. Maintain proper water management in the field. Avoid excessive nitrogen fertilization.",
    },
    DiseaseProfile {
        keyword: Some("wheat"),
        disease: "Wheat Rust",
        base_confidence: 95.1,
        description: "Wheat rust is a fungal disease that appears as rusty spots on leaves and stems. The three types are stem rust, leaf rust, and stripe rust, all caused by different Puccinia species.",
        treatment: "Plant rust-resistant wheat varieties. Apply fungicides like propiconazole or tebuconazole at the early signs of infection. Practice crop rotation to break the disease cycle.",
    },
    DiseaseProfile {
        keyword: Some("potato"),
        disease: "Potato Early Blight",
        base_confidence: 86.5,
        description: "Early blight is caused by the fungus Alternaria solani. It causes dark, concentric lesions on lower leaves first, then spreads upward on the plant as the disease progresses.",
        treatment: "Apply fungicides containing chlorothalonil or copper-based products. Maintain adequate plant nutrition, especially potassium. Practice crop rotation with non-host plants.",
    },
    DiseaseProfile {
        keyword: None,
        disease: "Tomato Late Blight",
        base_confidence: 92.7,
        description: "Late blight is a disease caused by the fungus-like oomycete pathogen Phytophthora infestans. It can cause significant yield losses and primarily affects leaves, stems, and fruits.",
        treatment: "Apply fungicide containing chlorothalonil or mancozeb every 7-10 days. Remove and destroy infected plant parts. Ensure proper spacing between plants for good air circulation.",
    },
];

/// The entry for `file_name`: first keyword contained in it, else the default.
pub fn profile_for(file_name: &str) -> &'static DiseaseProfile {
    let lowered = file_name.to_lowercase();
    PROFILES
        .iter()
        .find(|p| p.keyword.is_none_or(|k| lowered.contains(k)))
        .unwrap_or(&PROFILES[PROFILES.len() - 1])
}

/// Validates uploads and produces mock diagnoses.
#[derive(Debug, Clone, Copy)]
pub struct DiseaseScanner {
    max_upload_bytes: u64,
}

impl Default for DiseaseScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl DiseaseScanner {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self { max_upload_bytes }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Check the name and size of an upload.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedImage`] unless the name ends in `.jpg`, `.jpeg` or `.png`
    /// - [`Error::EmptyImage`] for a zero-byte upload
    /// - [`Error::ImageTooLarge`] above the size limit
    pub fn validate(&self, file_name: &str, size: u64) -> Result<()> {
        let lowered = file_name.to_lowercase();
        if !ALLOWED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            return Err(Error::UnsupportedImage(file_name.to_string()));
        }
        if size == 0 {
            return Err(Error::EmptyImage);
        }
        if size > self.max_upload_bytes {
            return Err(Error::ImageTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }
        Ok(())
    }

    /// Diagnose an upload using the thread-local RNG.
    pub fn scan(&self, file_name: &str, size: u64) -> Result<DetectionResult> {
        self.scan_with_rng(file_name, size, &mut rand::rng())
    }

    /// Diagnose an upload with a caller-supplied RNG.
    pub fn scan_with_rng<R: Rng + ?Sized>(
        &self,
        file_name: &str,
        size: u64,
        rng: &mut R,
    ) -> Result<DetectionResult> {
        self.validate(file_name, size)?;

        let profile = profile_for(file_name);
        let jitter = rng.random_range(-CONFIDENCE_JITTER..=CONFIDENCE_JITTER);
        let confidence = round1(profile.base_confidence + jitter).min(MAX_CONFIDENCE);
        debug!(
            "Scanned {} ({} bytes): {} at {:.1}%",
            file_name, size, profile.disease, confidence
        );

        Ok(profile.to_result(confidence))
    }
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn scanner() -> DiseaseScanner {
        DiseaseScanner::default()
    }

    #[test]
    fn test_profile_keyword_order() {
        assert_eq!(profile_for("rice_leaf.jpg").disease, "Rice Blast");
        assert_eq!(profile_for("WHEAT.png").disease, "Wheat Rust");
        assert_eq!(profile_for("my-potato.jpeg").disease, "Potato Early Blight");
        assert_eq!(profile_for("leaf.jpg").disease, "Tomato Late Blight");
        // rice is checked before wheat and potato
        assert_eq!(profile_for("wheat_and_rice.jpg").disease, "Rice Blast");
        assert_eq!(profile_for("potato_wheat.jpg").disease, "Wheat Rust");
    }

    #[test]
    fn test_validate_extension() {
        let scanner = scanner();
        assert!(scanner.validate("leaf.JPG", 10).is_ok());
        assert!(scanner.validate("leaf.jpeg", 10).is_ok());
        assert!(scanner.validate("leaf.png", 10).is_ok());
        assert_eq!(
            scanner.validate("leaf.gif", 10),
            Err(Error::UnsupportedImage("leaf.gif".to_string()))
        );
        assert!(scanner.validate("jpg", 10).is_err());
        assert!(scanner.validate("leaf.png.exe", 10).is_err());
    }

    #[test]
    fn test_validate_size() {
        let scanner = DiseaseScanner::new(100);
        assert_eq!(scanner.validate("a.png", 0), Err(Error::EmptyImage));
        assert!(scanner.validate("a.png", 100).is_ok());
        assert_eq!(
            scanner.validate("a.png", 101),
            Err(Error::ImageTooLarge { size: 101, max: 100 })
        );
        assert_eq!(DiseaseScanner::default().max_upload_bytes(), 5_242_880);
    }

    #[test]
    fn test_scan_returns_profile_text() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = scanner().scan_with_rng("wheat.jpg", 2048, &mut rng).unwrap();
        assert_eq!(result.disease, "Wheat Rust");
        assert!(result.treatment.contains("propiconazole"));
        assert!((93.1..=97.1).contains(&result.confidence));
    }

    #[test]
    fn test_scan_rejects_before_diagnosis() {
        assert!(matches!(
            scanner().scan("notes.txt", 10),
            Err(Error::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_table_is_not_mutated_by_scans() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            scanner().scan_with_rng("rice.png", 1, &mut rng).unwrap();
        }
        assert_eq!(profile_for("rice.png").base_confidence, 88.3);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(92.74), 92.7);
        assert_eq!(round1(92.75), 92.8);
        assert_eq!(round1(-3.06), -3.1);
    }

    proptest! {
        #[test]
        fn prop_confidence_within_jitter_and_cap(seed in any::<u64>(), pick in 0usize..4) {
            let names = ["rice.jpg", "wheat.jpg", "potato.jpg", "tomato.jpg"];
            let mut rng = StdRng::seed_from_u64(seed);
            let result = scanner().scan_with_rng(names[pick], 1, &mut rng).unwrap();
            let base = profile_for(names[pick]).base_confidence;

            prop_assert!(result.confidence <= MAX_CONFIDENCE);
            prop_assert!((result.confidence - base).abs() <= CONFIDENCE_JITTER + 0.05);
            prop_assert_eq!(round1(result.confidence), result.confidence);
        }
    }
}
