//! # abscisa
//!
//! Référencement linéaire le long d'un axe de corridor (routes, pipelines,
//! lignes de transport): abscisse au format K+ et distance perpendiculaire de
//! chaque entité.
//!
//! ## Features
//!
//! - Codec d'abscisses `K{km}+{m:03}` (format, parse, repères réguliers)
//! - Projection plane point -> polyligne avec bornage aux extrémités
//! - Normalisation d'axes fragmentés (MultiLineString) en une polyligne
//! - Annotation de collections d'entités (point, ligne, polygone)
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! Les géométries doivent déjà être dans un système projeté (mètres).
//!
//! ## Usage
//!
//! ```rust
//! use abscisa::{annotate, Alignment, RawFeature};
//! use geo::LineString;
//!
//! let axis = Alignment::new(LineString::from(vec![(0.0, 0.0), (10000.0, 0.0)]))?;
//! let features = vec![RawFeature::point(5000.0, 100.0, "Name", Some("Fuente A"))];
//!
//! let annotated = annotate(&features, &axis, "Name");
//! assert_eq!(annotated[0].chainage_label, "K5+000");
//! assert_eq!(annotated[0].offset_m, 100.0);
//!
//! for marker in &axis.markers(1000.0, 0.0)? {
//!     println!("{} ({:.0}, {:.0})", marker.label, marker.point.x(), marker.point.y());
//! }
//! # Ok::<(), abscisa::AbscisaError>(())
//! ```

pub mod annotate;
pub mod chainage;
pub mod error;
pub mod normalize;
pub mod projection;
pub mod types;

pub use annotate::{annotate, annotate_par, filter_by_radius, sort_by_chainage};
pub use chainage::{
    chainage_stations, format_chainage, generate_markers, parse_chainage, Chainage, MarkerSeries,
    StationSeries,
};
pub use error::AbscisaError;
pub use normalize::{extract_primary, normalize};
pub use projection::{interpolate, perpendicular_distance, project, signed_offset};
pub use types::{
    Alignment, AnnotatedFeature, Attributes, ChainageMarker, FeatureGeometry, LineProjection,
    RawFeature, UNNAMED,
};

/// Version de la bibliothèque
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
