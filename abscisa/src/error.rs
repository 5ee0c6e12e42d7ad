//! Types d'erreurs pour le crate abscisa

use thiserror::Error;

/// Erreurs pouvant survenir lors du référencement linéaire
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AbscisaError {
    /// Étiquette d'abscisse mal formée (attendu `K{km}+{m}`)
    #[error("Invalid chainage format: {label:?} ({reason})")]
    Format { label: String, reason: String },

    /// Paramètre hors domaine (intervalle nul ou négatif, etc.)
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Collection d'entrée vide
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Type de géométrie non accepté par l'opération
    #[error("Unexpected geometry type: expected {expected}, got {found}")]
    GeometryType {
        expected: &'static str,
        found: &'static str,
    },

    /// Axe inutilisable (moins de 2 sommets, coordonnées non finies)
    #[error("Degenerate alignment: {0}")]
    DegenerateAlignment(String),
}

impl AbscisaError {
    /// Crée une erreur de format avec contexte
    pub fn format(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de paramètre invalide
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
