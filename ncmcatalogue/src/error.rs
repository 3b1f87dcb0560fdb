//! Gestion des erreurs pour le client du catalogue

use thiserror::Error;

/// Type Result personnalisé pour ncmcatalogue
pub type Result<T> = std::result::Result<T, CatalogueError>;

/// Erreurs possibles lors de l'accès au catalogue
#[derive(Error, Debug)]
pub enum CatalogueError {
    /// Session absente ou expirée côté passerelle
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Ressource non trouvée (playlist, album, track, etc.)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur renvoyée dans le champ `code` de la réponse
    #[error("Catalogue API error (code {code}): {message}")]
    ApiError { code: i64, message: String },

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Erreur générique
    #[error("Catalogue error: {0}")]
    Other(String),
}

impl CatalogueError {
    /// Crée une erreur depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code: code as i64,
                message: message.into(),
            },
        }
    }

    /// Crée une erreur depuis le champ `code` d'une réponse JSON
    ///
    /// La passerelle répond parfois en HTTP 200 avec un code applicatif
    /// différent de 200 (301 = non connecté, 404 = ressource absente…).
    pub fn from_api_code(code: i64, message: impl Into<String>) -> Self {
        match code {
            301 | 401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            405 | 429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Vérifie si l'erreur vient d'une session invalide
    pub fn is_auth_error(&self) -> bool {
        matches!(self, CatalogueError::Unauthorized(_))
    }

    /// Vérifie si l'erreur est une erreur de rate limiting
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CatalogueError::RateLimitExceeded)
    }
}
