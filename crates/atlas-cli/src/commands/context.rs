//! 명령 실행 컨텍스트.
//!
//! 설정에 따라 카탈로그와 신뢰도 저장소를 열고 `MatchService`를 구성합니다.
//! 저장소는 항상 `database.url`의 영속 백엔드이며, 열 수 없으면 명령이
//! 실패합니다. 기본값은 `data/atlas.db` SQLite 파일입니다.

use anyhow::{Context, Result};
use atlas_core::AppConfig;
use atlas_engine::{Catalog, MatchService};
use atlas_store::ConfidenceStore;

/// 명령 실행에 필요한 공유 상태.
pub struct AppContext {
    pub config: AppConfig,
    pub service: MatchService,
}

impl AppContext {
    /// 설정으로부터 컨텍스트를 구성합니다.
    pub async fn build(config: AppConfig) -> Result<Self> {
        let catalog = Catalog::from_path(&config.catalog.path)
            .with_context(|| format!("Failed to load catalog: {}", config.catalog.path))?;

        let store = open_store(&config).await?;

        let service = MatchService::new(catalog, store).with_tie_break(config.matching.tie_break);

        Ok(Self { config, service })
    }

    pub fn store(&self) -> &ConfidenceStore {
        self.service.store()
    }
}

/// 설정에 맞는 신뢰도 저장소를 엽니다.
async fn open_store(config: &AppConfig) -> Result<ConfidenceStore> {
    ConfidenceStore::open(&config.database)
        .await
        .with_context(|| format!("Failed to open confidence store: {}", redact(&config.database.url)))
}

/// URL의 비밀번호를 가립니다.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let userinfo = &url[scheme_end + 3..at];
            match userinfo.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme_end + 3],
                    &userinfo[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
