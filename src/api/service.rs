//! Repository administration operations
//!
//! Every operation checks the API-enabled switch before looking at any
//! parameter. Validation failures, authentication failures and catalog
//! errors all come back as a failed [`ApiResponse`]; nothing is raised to
//! the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::ApiError;
use super::params::RequestParams;
use super::response::ApiResponse;
use crate::auth::{CanonicalMessage, HmacType, SignedRequestVerifier};
use crate::config::ApiSettings;
use crate::queue::UniqueWorkQueue;
use crate::repository::{
    RepositoryCatalog, RepositoryRecord, ScmType, normalize_branch, normalize_name,
};
use crate::scheduler::JobScheduler;

type ApiResult = std::result::Result<ApiResponse, ApiError>;

/// Fields `add` requires, in validation order, and whether a blank value
/// is rejected
const ADD_FIELDS: [(&str, bool); 7] = [
    ("reponame", true),
    ("repourl", true),
    ("repotype", false),
    ("repousername", false),
    ("repopassword", false),
    ("reposource", false),
    ("repobranch", false),
];

/// The repository administration API
pub struct RepositoryAdminService {
    settings: ApiSettings,
    verifier: SignedRequestVerifier,
    catalog: Arc<dyn RepositoryCatalog>,
    scheduler: Arc<dyn JobScheduler>,
    delete_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
}

impl RepositoryAdminService {
    /// Create the service over its collaborators
    #[must_use]
    pub fn new(
        settings: ApiSettings,
        verifier: SignedRequestVerifier,
        catalog: Arc<dyn RepositoryCatalog>,
        scheduler: Arc<dyn JobScheduler>,
        delete_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    ) -> Self {
        Self {
            settings,
            verifier,
            catalog,
            scheduler,
            delete_queue,
        }
    }

    /// API switches this service runs with
    #[must_use]
    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Rebuild every index, then queue every repository for indexing
    pub async fn reindex_all(&self, params: &RequestParams) -> ApiResponse {
        respond("reindex", self.try_reindex_all(params).await)
    }

    /// Queue the repository with the given `repoUrl` for indexing
    pub async fn index_one(&self, params: &RequestParams) -> ApiResponse {
        respond("index", self.try_index_one(params).await)
    }

    /// Every registered repository
    pub async fn list(&self, params: &RequestParams) -> ApiResponse {
        respond("list", self.try_list(params).await)
    }

    /// Queue the repository named `reponame` for deletion
    pub async fn delete(&self, params: &RequestParams) -> ApiResponse {
        respond("delete", self.try_delete(params).await)
    }

    /// Register a new repository
    pub async fn add(&self, params: &RequestParams) -> ApiResponse {
        respond("add", self.try_add(params).await)
    }

    async fn try_reindex_all(&self, params: &RequestParams) -> ApiResult {
        self.ensure_enabled()?;
        self.authenticate(params, |public_key| {
            CanonicalMessage::new().param("pub", public_key)
        })?;

        if !self.scheduler.rebuild_all().await {
            return Err(ApiError::DownstreamFailure);
        }
        self.scheduler.force_enqueue().await;

        info!("Reindex of all repositories forced");
        Ok(ApiResponse::success("reindex forced"))
    }

    async fn try_index_one(&self, params: &RequestParams) -> ApiResult {
        self.ensure_enabled()?;
        let url = params
            .non_blank("repoUrl")
            .ok_or(ApiError::MissingParameter("repoUrl"))?;

        let Some(record) = self.catalog.get_by_url(url).await? else {
            return Err(ApiError::NotFound(url.to_string()));
        };

        self.scheduler.force_enqueue_repository(&record).await;
        Ok(ApiResponse::success(format!("Enqueued repository {}", url)))
    }

    async fn try_list(&self, params: &RequestParams) -> ApiResult {
        self.ensure_enabled()?;
        self.authenticate(params, |public_key| {
            CanonicalMessage::new().param("pub", public_key)
        })?;

        let repositories = self.catalog.list().await?;
        Ok(ApiResponse::with_repositories(repositories))
    }

    async fn try_delete(&self, params: &RequestParams) -> ApiResult {
        self.ensure_enabled()?;
        let name = params
            .non_blank("reponame")
            .ok_or(ApiError::MissingParameter("reponame"))?;

        self.authenticate(params, |public_key| {
            CanonicalMessage::new()
                .param("pub", public_key)
                .param("reponame", name)
        })?;

        let Some(record) = self.catalog.get_by_name(&normalize_name(name)).await? else {
            return Err(ApiError::AlreadyDeleted);
        };

        if !self.delete_queue.add(record).await {
            debug!("{} is already pending deletion", name);
        }
        Ok(ApiResponse::success("repository queued for deletion"))
    }

    async fn try_add(&self, params: &RequestParams) -> ApiResult {
        self.ensure_enabled()?;

        for (field, reject_blank) in ADD_FIELDS {
            let value = if reject_blank {
                params.non_blank(field)
            } else {
                params.get(field)
            };
            if value.is_none() {
                return Err(ApiError::MissingParameter(field));
            }
        }
        let field = |name: &str| raw_value(params, name);

        self.authenticate(params, |public_key| {
            ADD_FIELDS.iter().fold(
                CanonicalMessage::new().param("pub", public_key),
                |message, (name, _)| message.param(name, field(*name)),
            )
        })?;

        let name = normalize_name(field("reponame"));
        let record = RepositoryRecord::new(&name, field("repourl"))
            .with_scm(ScmType::parse_lenient(Some(field("repotype"))))
            .with_credentials(field("repousername"), field("repopassword"))
            .with_source(field("reposource"))
            .with_branch(&normalize_branch(Some(field("repobranch"))));

        let saved = self
            .catalog
            .insert_new(record)
            .await?
            .ok_or(ApiError::Conflict)?;
        info!("Added repository {} ({})", saved.name(), saved.url);
        Ok(ApiResponse::success("added repository successfully"))
    }

    fn ensure_enabled(&self) -> Result<(), ApiError> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(ApiError::FeatureDisabled)
        }
    }

    fn authenticate(
        &self,
        params: &RequestParams,
        message: impl FnOnce(&str) -> CanonicalMessage,
    ) -> Result<(), ApiError> {
        if !self.settings.auth_required {
            return Ok(());
        }

        let public_key = params
            .non_blank("pub")
            .ok_or(ApiError::AuthRequired("pub"))?;
        let signature = params
            .non_blank("sig")
            .ok_or(ApiError::AuthRequired("sig"))?;
        let algorithm = HmacType::from_hint(params.get("hmac"));
        let message = message(public_key).render();

        if self
            .verifier
            .verify(public_key, signature, &message, algorithm)
        {
            Ok(())
        } else {
            Err(ApiError::InvalidSignature)
        }
    }
}

fn raw_value<'a>(params: &'a RequestParams, name: &str) -> &'a str {
    params.get(name).unwrap_or_default()
}

fn respond(operation: &str, result: ApiResult) -> ApiResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            if err.is_alarming() {
                warn!("{} failed: {}", operation, err);
            } else {
                debug!("{} rejected: {}", operation, err);
            }
            err.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ApiKey, StaticKeyStore, sign};
    use crate::error::{Error, Result};
    use crate::queue::QueueIdentity;
    use crate::repository::MemoryCatalog;
    use crate::scheduler::IndexScheduler;
    use async_trait::async_trait;

    const PUBLIC: &str = "APIK-public";
    const SECRET: &str = "APIK-secret";

    struct Harness {
        service: Arc<RepositoryAdminService>,
        catalog: Arc<MemoryCatalog>,
        scheduler: Arc<IndexScheduler>,
        delete_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    }

    fn harness(settings: ApiSettings) -> Harness {
        let catalog = Arc::new(MemoryCatalog::new());
        let scheduler = Arc::new(IndexScheduler::new(
            catalog.clone(),
            Arc::new(UniqueWorkQueue::new()),
        ));
        let delete_queue = Arc::new(UniqueWorkQueue::new());
        let verifier = SignedRequestVerifier::new(Arc::new(StaticKeyStore::from_keys([
            ApiKey::new(PUBLIC, SECRET),
        ])));

        let service = Arc::new(RepositoryAdminService::new(
            settings,
            verifier,
            catalog.clone(),
            scheduler.clone(),
            delete_queue.clone(),
        ));

        Harness {
            service,
            catalog,
            scheduler,
            delete_queue,
        }
    }

    fn enabled() -> ApiSettings {
        ApiSettings {
            enabled: true,
            auth_required: true,
        }
    }

    fn open() -> ApiSettings {
        ApiSettings {
            enabled: true,
            auth_required: false,
        }
    }

    /// Sign `pairs` (after `pub`) and return the full parameter bag
    fn signed(pairs: &[(&str, &str)], algorithm: HmacType) -> RequestParams {
        let message = pairs
            .iter()
            .fold(CanonicalMessage::new().param("pub", PUBLIC), |m, (k, v)| {
                m.param(k, v)
            });
        let signature = sign(SECRET, &message.render(), algorithm);

        let mut params: RequestParams = pairs.iter().copied().collect();
        params.insert("pub", PUBLIC);
        params.insert("sig", &signature);
        if algorithm == HmacType::Sha512 {
            params.insert("hmac", "sha512");
        }
        params
    }

    fn add_pairs<'a>(name: &'a str, url: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![
            ("reponame", name),
            ("repourl", url),
            ("repotype", "GIT"),
            ("repousername", ""),
            ("repopassword", ""),
            ("reposource", ""),
            ("repobranch", ""),
        ]
    }

    async fn seed(h: &Harness, name: &str, url: &str) -> RepositoryRecord {
        h.catalog
            .save(RepositoryRecord::new(name, url))
            .await
            .unwrap()
    }

    mod disabled {
        use super::*;

        #[tokio::test]
        async fn test_every_operation_rejected_without_params() {
            let h = harness(ApiSettings::default());
            let empty = RequestParams::new();

            for response in [
                h.service.reindex_all(&empty).await,
                h.service.index_one(&empty).await,
                h.service.list(&empty).await,
                h.service.delete(&empty).await,
                h.service.add(&empty).await,
            ] {
                assert!(!response.ok);
                assert_eq!(response.message, "API not enabled");
            }
        }

        #[tokio::test]
        async fn test_valid_add_rejected() {
            let h = harness(ApiSettings {
                enabled: false,
                auth_required: false,
            });
            let params: RequestParams = add_pairs("repo", "https://x/y.git").into_iter().collect();

            let response = h.service.add(&params).await;
            assert_eq!(response.message, "API not enabled");
            assert!(h.catalog.is_empty().await);
        }
    }

    mod authentication {
        use super::*;

        #[tokio::test]
        async fn test_missing_pub_then_sig() {
            let h = harness(enabled());

            let response = h.service.list(&RequestParams::new()).await;
            assert_eq!(response.message, "pub is a required parameter");

            let response = h
                .service
                .list(&RequestParams::new().with("pub", PUBLIC))
                .await;
            assert_eq!(response.message, "sig is a required parameter");

            let response = h
                .service
                .list(&RequestParams::new().with("pub", " ").with("sig", "abc"))
                .await;
            assert_eq!(response.message, "pub is a required parameter");
        }

        #[tokio::test]
        async fn test_list_sha1_and_sha512() {
            let h = harness(enabled());
            seed(&h, "repo", "https://x/y.git").await;

            for algorithm in [HmacType::Sha1, HmacType::Sha512] {
                let response = h.service.list(&signed(&[], algorithm)).await;
                assert!(response.ok, "{}", algorithm);
                assert_eq!(response.data.unwrap().len(), 1);
            }
        }

        #[tokio::test]
        async fn test_wrong_signature() {
            let h = harness(enabled());
            let params = RequestParams::new().with("pub", PUBLIC).with("sig", "deadbeef");

            let response = h.service.list(&params).await;
            assert!(!response.ok);
            assert_eq!(response.message, "invalid signed url");
        }

        #[tokio::test]
        async fn test_unknown_public_key() {
            let h = harness(enabled());
            let signature = sign(SECRET, "pub=APIK-other", HmacType::Sha1);
            let params = RequestParams::new()
                .with("pub", "APIK-other")
                .with("sig", &signature);

            assert_eq!(h.service.list(&params).await.message, "invalid signed url");
        }

        #[tokio::test]
        async fn test_reindex_sha512_hint_with_sha1_signature() {
            let h = harness(enabled());
            let mut params = signed(&[], HmacType::Sha1);
            params.insert("hmac", "sha512");

            let response = h.service.reindex_all(&params).await;
            assert!(!response.ok);
            assert_eq!(response.message, "invalid signed url");
            assert_eq!(h.scheduler.generation(), 0);
        }

        #[tokio::test]
        async fn test_unknown_hint_falls_back_to_sha1() {
            let h = harness(enabled());
            let mut params = signed(&[], HmacType::Sha1);
            params.insert("hmac", "sha256");

            assert!(h.service.reindex_all(&params).await.ok);
        }

        #[tokio::test]
        async fn test_auth_disabled_skips_signature() {
            let h = harness(open());
            seed(&h, "repo", "https://x/y.git").await;

            assert!(h.service.reindex_all(&RequestParams::new()).await.ok);
            assert!(h.service.list(&RequestParams::new()).await.ok);

            let delete = RequestParams::new().with("reponame", "repo");
            assert!(h.service.delete(&delete).await.ok);

            let add: RequestParams = add_pairs("other", "https://x/z.git").into_iter().collect();
            assert!(h.service.add(&add).await.ok);
        }
    }

    mod reindex {
        use super::*;

        struct RefusingScheduler;

        #[async_trait]
        impl JobScheduler for RefusingScheduler {
            async fn rebuild_all(&self) -> bool {
                false
            }

            async fn force_enqueue(&self) -> bool {
                panic!("force_enqueue must not run after a refused rebuild");
            }

            async fn force_enqueue_repository(&self, _record: &RepositoryRecord) -> bool {
                true
            }
        }

        #[tokio::test]
        async fn test_reindex_forces_every_repository() {
            let h = harness(enabled());
            seed(&h, "a", "https://x/a.git").await;
            seed(&h, "b", "https://x/b.git").await;

            let response = h.service.reindex_all(&signed(&[], HmacType::Sha1)).await;
            assert!(response.ok);
            assert_eq!(response.message, "reindex forced");
            assert_eq!(h.scheduler.generation(), 1);
            assert_eq!(h.scheduler.index_queue().len().await, 2);
        }

        #[tokio::test]
        async fn test_reindex_while_paused() {
            let h = harness(enabled());
            h.scheduler.pause();

            let response = h.service.reindex_all(&signed(&[], HmacType::Sha1)).await;
            assert!(!response.ok);
            assert_eq!(response.message, "was unable to force the index");
        }

        #[tokio::test]
        async fn test_refused_rebuild_skips_force_enqueue() {
            let service = RepositoryAdminService::new(
                open(),
                SignedRequestVerifier::new(Arc::new(StaticKeyStore::new())),
                Arc::new(MemoryCatalog::new()),
                Arc::new(RefusingScheduler),
                Arc::new(UniqueWorkQueue::new()),
            );

            let response = service.reindex_all(&RequestParams::new()).await;
            assert_eq!(response.message, "was unable to force the index");
        }
    }

    mod index_one {
        use super::*;

        #[tokio::test]
        async fn test_enqueues_known_url_without_signature() {
            let h = harness(enabled());
            seed(&h, "repo", "https://x/y.git").await;

            let params = RequestParams::new().with("repoUrl", "https://x/y.git");
            let response = h.service.index_one(&params).await;

            assert!(response.ok);
            assert_eq!(response.message, "Enqueued repository https://x/y.git");
            assert!(h.scheduler.index_queue().contains("repo").await);
        }

        #[tokio::test]
        async fn test_unknown_url() {
            let h = harness(enabled());
            let params = RequestParams::new().with("repoUrl", "https://x/missing.git");

            let response = h.service.index_one(&params).await;
            assert!(!response.ok);
            assert_eq!(
                response.message,
                "Was unable to find repository https://x/missing.git"
            );
        }

        #[tokio::test]
        async fn test_missing_url() {
            let h = harness(enabled());

            for params in [
                RequestParams::new(),
                RequestParams::new().with("repoUrl", ""),
            ] {
                let response = h.service.index_one(&params).await;
                assert_eq!(response.message, "repoUrl is a required parameter");
            }
        }
    }

    mod delete {
        use super::*;

        #[tokio::test]
        async fn test_reponame_checked_before_auth() {
            let h = harness(enabled());
            let response = h.service.delete(&RequestParams::new()).await;
            assert_eq!(response.message, "reponame is a required parameter");

            let blank = RequestParams::new().with("reponame", "   ");
            assert_eq!(
                h.service.delete(&blank).await.message,
                "reponame is a required parameter"
            );
        }

        #[tokio::test]
        async fn test_missing_repository() {
            let h = harness(enabled());

            let response = h
                .service
                .delete(&signed(&[("reponame", "ghost")], HmacType::Sha1))
                .await;
            assert!(!response.ok);
            assert_eq!(response.message, "repository already deleted");
            assert!(h.delete_queue.is_empty().await);
        }

        #[tokio::test]
        async fn test_queues_existing_repository() {
            let h = harness(enabled());
            seed(&h, "repo", "https://x/y.git").await;

            let response = h
                .service
                .delete(&signed(&[("reponame", "repo")], HmacType::Sha512))
                .await;
            assert!(response.ok);
            assert_eq!(response.message, "repository queued for deletion");
            assert_eq!(h.delete_queue.len().await, 1);
            // Removal happens later, in the deletion worker
            assert_eq!(h.catalog.len().await, 1);
        }

        #[tokio::test]
        async fn test_signature_covers_reponame() {
            let h = harness(enabled());
            seed(&h, "repo", "https://x/y.git").await;

            let mut params = signed(&[("reponame", "other")], HmacType::Sha1);
            params.insert("reponame", "repo");

            let response = h.service.delete(&params).await;
            assert_eq!(response.message, "invalid signed url");
            assert!(h.delete_queue.is_empty().await);
        }

        #[tokio::test]
        async fn test_name_with_spaces_matches_normalized_record() {
            let h = harness(open());
            seed(&h, "My Repo", "https://x/y.git").await;

            let params = RequestParams::new().with("reponame", "My Repo");
            assert!(h.service.delete(&params).await.ok);
            assert!(h.delete_queue.contains("My-Repo").await);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn test_concurrent_deletes_queue_once() {
            let h = harness(enabled());
            seed(&h, "repo", "https://x/y.git").await;
            let params = signed(&[("reponame", "repo")], HmacType::Sha1);

            let mut handles = Vec::new();
            for _ in 0..32 {
                let service = h.service.clone();
                let params = params.clone();
                handles.push(tokio::spawn(async move { service.delete(&params).await }));
            }

            for handle in handles {
                let response = handle.await.unwrap();
                assert!(response.ok);
                assert_eq!(response.message, "repository queued for deletion");
            }

            let pending = h.delete_queue.drain().await;
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].queue_key(), "repo");
        }
    }

    mod add {
        use super::*;

        #[tokio::test]
        async fn test_add_normalizes_inputs() {
            let h = harness(enabled());
            let params = signed(&add_pairs("My Repo", "https://x/y.git"), HmacType::Sha1);

            let response = h.service.add(&params).await;
            assert!(response.ok, "{}", response.message);
            assert_eq!(response.message, "added repository successfully");

            let records = h.catalog.list().await.unwrap();
            assert_eq!(records.len(), 1);
            let record = &records[0];
            assert_eq!(record.name(), "My-Repo");
            assert_eq!(record.url, "https://x/y.git");
            assert_eq!(record.scm, ScmType::Git);
            assert_eq!(record.branch(), "master");
            assert_eq!(record.username, "");
            assert!(record.data.is_empty());
            assert!(record.is_saved());
        }

        #[tokio::test]
        async fn test_add_keeps_explicit_values() {
            let h = harness(open());
            let params: RequestParams = [
                ("reponame", "svn-repo"),
                ("repourl", "svn://x/trunk"),
                ("repotype", " svn "),
                ("repousername", "alice"),
                ("repopassword", "hunter2"),
                ("reposource", "mirror"),
                ("repobranch", "trunk"),
            ]
            .into_iter()
            .collect();

            assert!(h.service.add(&params).await.ok);

            let record = h.catalog.get_by_name("svn-repo").await.unwrap().unwrap();
            assert_eq!(record.scm, ScmType::Svn);
            assert_eq!(record.username, "alice");
            assert_eq!(record.password, "hunter2");
            assert_eq!(record.source, "mirror");
            assert_eq!(record.branch(), "trunk");
        }

        #[tokio::test]
        async fn test_unknown_type_defaults_to_git() {
            let h = harness(open());
            let mut params: RequestParams = add_pairs("repo", "https://x/y.git").into_iter().collect();
            params.insert("repotype", "mercurial");

            assert!(h.service.add(&params).await.ok);
            let record = h.catalog.get_by_name("repo").await.unwrap().unwrap();
            assert_eq!(record.scm, ScmType::Git);
        }

        #[tokio::test]
        async fn test_duplicate_name_conflicts() {
            let h = harness(enabled());
            let first = signed(&add_pairs("My Repo", "https://x/y.git"), HmacType::Sha1);
            let second = signed(&add_pairs("My-Repo", "https://x/z.git"), HmacType::Sha1);

            assert!(h.service.add(&first).await.ok);

            let response = h.service.add(&second).await;
            assert!(!response.ok);
            assert_eq!(response.message, "repository name already exists");
            assert_eq!(h.catalog.len().await, 1);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn test_concurrent_adds_of_one_name() {
            let h = harness(open());

            let mut handles = Vec::new();
            for i in 0..16 {
                let service = h.service.clone();
                handles.push(tokio::spawn(async move {
                    let url = format!("https://x/{}.git", i);
                    let params: RequestParams = add_pairs("shared", &url).into_iter().collect();
                    service.add(&params).await
                }));
            }

            let mut added = 0;
            for handle in handles {
                let response = handle.await.unwrap();
                if response.ok {
                    added += 1;
                } else {
                    assert_eq!(response.message, "repository name already exists");
                }
            }

            assert_eq!(added, 1);
            assert_eq!(h.catalog.len().await, 1);
        }

        #[tokio::test]
        async fn test_field_validation_order() {
            let h = harness(enabled());
            let full: Vec<(&str, &str)> = add_pairs("repo", "https://x/y.git");

            for (missing, _) in &full {
                let params: RequestParams =
                    full.iter().filter(|(k, _)| k != missing).copied().collect();
                let response = h.service.add(&params).await;
                assert_eq!(response.message, format!("{} is a required parameter", missing));
            }

            let response = h.service.add(&RequestParams::new()).await;
            assert_eq!(response.message, "reponame is a required parameter");

            let mut blank_url: RequestParams = full.iter().copied().collect();
            blank_url.insert("repourl", " ");
            assert_eq!(
                h.service.add(&blank_url).await.message,
                "repourl is a required parameter"
            );
        }

        #[tokio::test]
        async fn test_validation_precedes_auth() {
            let h = harness(enabled());
            let params = RequestParams::new().with("reponame", "repo");

            let response = h.service.add(&params).await;
            assert_eq!(response.message, "repourl is a required parameter");
        }

        #[tokio::test]
        async fn test_signature_over_raw_values() {
            let h = harness(enabled());
            let params = signed(&add_pairs("My Repo", "https://x/y.git"), HmacType::Sha512);
            assert!(h.service.add(&params).await.ok);

            // Signing the normalized name instead fails
            let mut tampered = signed(&add_pairs("Other-Repo", "https://x/o.git"), HmacType::Sha1);
            tampered.insert("reponame", "Other Repo");
            assert_eq!(h.service.add(&tampered).await.message, "invalid signed url");
        }
    }

    mod storage {
        use super::*;

        struct BrokenCatalog;

        #[async_trait]
        impl RepositoryCatalog for BrokenCatalog {
            async fn get_by_name(&self, _name: &str) -> Result<Option<RepositoryRecord>> {
                Err(Error::catalog("offline"))
            }

            async fn get_by_url(&self, _url: &str) -> Result<Option<RepositoryRecord>> {
                Err(Error::catalog("offline"))
            }

            async fn list(&self) -> Result<Vec<RepositoryRecord>> {
                Err(Error::catalog("offline"))
            }

            async fn save(&self, _record: RepositoryRecord) -> Result<RepositoryRecord> {
                Err(Error::catalog("offline"))
            }

            async fn insert_new(
                &self,
                _record: RepositoryRecord,
            ) -> Result<Option<RepositoryRecord>> {
                Err(Error::catalog("offline"))
            }

            async fn delete_by_name(&self, _name: &str) -> Result<bool> {
                Err(Error::catalog("offline"))
            }
        }

        #[tokio::test]
        async fn test_catalog_failure_becomes_response() {
            let catalog: Arc<dyn RepositoryCatalog> = Arc::new(BrokenCatalog);
            let service = RepositoryAdminService::new(
                open(),
                SignedRequestVerifier::new(Arc::new(StaticKeyStore::new())),
                catalog.clone(),
                Arc::new(IndexScheduler::new(catalog, Arc::new(UniqueWorkQueue::new()))),
                Arc::new(UniqueWorkQueue::new()),
            );

            let response = service.list(&RequestParams::new()).await;
            assert!(!response.ok);
            assert_eq!(response.message, "repository storage error: offline");

            let response = service
                .delete(&RequestParams::new().with("reponame", "repo"))
                .await;
            assert_eq!(response.message, "repository storage error: offline");

            let response = service
                .index_one(&RequestParams::new().with("repoUrl", "https://x/y.git"))
                .await;
            assert_eq!(response.message, "repository storage error: offline");
        }

        #[tokio::test]
        async fn test_failed_add_can_be_retried() {
            let dir = tempfile::tempdir().unwrap();
            let state = dir.path().join("state");
            let catalog = Arc::new(MemoryCatalog::open(state.join("catalog.json")).unwrap());
            let dyn_catalog: Arc<dyn RepositoryCatalog> = catalog.clone();
            let service = RepositoryAdminService::new(
                open(),
                SignedRequestVerifier::new(Arc::new(StaticKeyStore::new())),
                dyn_catalog.clone(),
                Arc::new(IndexScheduler::new(dyn_catalog, Arc::new(UniqueWorkQueue::new()))),
                Arc::new(UniqueWorkQueue::new()),
            );
            let params: RequestParams = add_pairs("repo", "https://x/y.git").into_iter().collect();

            // Snapshot writes fail while the directory is a regular file
            std::fs::write(&state, "").unwrap();

            let response = service.add(&params).await;
            assert!(!response.ok);
            assert!(response.message.starts_with("repository storage error"));
            assert!(catalog.is_empty().await);

            std::fs::remove_file(&state).unwrap();

            let response = service.add(&params).await;
            assert!(response.ok, "{}", response.message);
            assert_eq!(catalog.len().await, 1);
        }
    }
}
