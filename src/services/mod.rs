//! Business logic services

pub mod accounts;
pub mod auth;
pub mod borrows;
pub mod catalog;
pub mod media;
pub mod public;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub borrows: borrows::BorrowsService,
    pub public: public::PublicService,
    pub media: media::MediaStore,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let media = media::MediaStore::new(&config.media);
        let borrows = borrows::BorrowsService::new(repository.clone());

        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            accounts: accounts::AccountsService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), media.clone()),
            public: public::PublicService::new(repository.clone(), borrows.clone()),
            borrows,
            media,
            repository,
        }
    }

    /// Readiness: the storage answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
