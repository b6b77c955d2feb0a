use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_kafka::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub auth_gate: Arc<dyn AuthGate>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>, auth_gate: Arc<dyn AuthGate>) -> Self {
        Self {
            auth_service,
            auth_gate,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        if settings.auth.signing_key.is_empty() {
            return Err(anyhow!("auth.signing_key is empty"));
        }
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            signing_key: settings.auth.signing_key.clone().into_bytes(),
        }));

        let revocation_store: Arc<dyn RevocationStore> = match settings.store.backend.as_str() {
            "memory" => Arc::new(MemoryRevocationStore::new()),
            "redis" => {
                let url = settings
                    .store
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.url is required for the redis backend"))?;
                let redis_client = redis::Client::open(url)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisRevocationStore::new(
                    redis_manager,
                    settings.store.prefix.clone(),
                    Duration::from_millis(settings.store.timeout_ms),
                ))
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let mut pool = None;
        let mut withdrawal_listeners: Vec<Arc<dyn WithdrawalListener>> = Vec::new();
        let member_repo: Arc<dyn MemberRepo> = match settings.member.backend.as_str() {
            "memory" => Arc::new(MemoryMemberRepo::new()),
            "mysql" => {
                let url = settings
                    .member
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow!("member.url is required for the mysql backend"))?;
                let mysql = Pool::<MySql>::connect(url).await?;
                withdrawal_listeners.push(Arc::new(MySqlPortfolioWithdrawal::new(mysql.clone())));
                pool = Some(mysql.clone());
                Arc::new(MySqlMemberRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown member backend: {}", other)),
        };

        if let Some(brokers) = settings.withdrawal.kafka_brokers.as_deref() {
            withdrawal_listeners.push(Arc::new(KafkaWithdrawalPublisher::new(
                brokers,
                &format!("tokenkeeper-{}", run_id),
                &settings.withdrawal.topic,
            )?));
        }

        let credential_policy = Arc::new(CredentialPolicy::new(&PasswordPolicyConfig {
            pattern: settings.auth.password_pattern.clone(),
            required_classes: settings.auth.password_required_classes.clone(),
            temp_password_length: settings.auth.temp_password_length,
        })?);
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            member_repo.clone(),
            credential_hasher,
            token_codec.clone(),
            revocation_store.clone(),
            withdrawal_listeners,
            credential_policy,
        ));
        let auth_gate: Arc<dyn AuthGate> = Arc::new(RealAuthGate::new(
            member_repo,
            token_codec,
            revocation_store,
            settings.gate.check_denylist,
        ));

        info!(
            %run_id,
            store = %settings.store.backend,
            member = %settings.member.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            auth_gate,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
