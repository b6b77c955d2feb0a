use crate::application_port::AuthError;
use crate::domain_model::{Member, MemberId};
use crate::domain_port::WithdrawalListener;
use crate::logger::*;
use chrono::{DateTime, Utc};
use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct MemberWithdrawn<'a> {
    member_id: MemberId,
    email: &'a str,
    withdrawn_at: DateTime<Utc>,
}

/// Announces withdrawals to domains living outside this service.
pub struct KafkaWithdrawalPublisher {
    inner: FutureProducer,
    topic: String,
}

impl KafkaWithdrawalPublisher {
    pub fn new(bootstrap_server: &str, client_id: &str, topic: &str) -> anyhow::Result<Self> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_server)
            .set("client.id", client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "1")
            .create()?;
        Ok(Self {
            inner,
            topic: topic.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl WithdrawalListener for KafkaWithdrawalPublisher {
    async fn on_member_withdrawn(&self, member: &Member) -> Result<(), AuthError> {
        let event = MemberWithdrawn {
            member_id: member.id,
            email: &member.email,
            withdrawn_at: Utc::now(),
        };
        let payload =
            serde_json::to_vec(&event).map_err(|e| AuthError::InternalError(e.to_string()))?;
        let key = member.id.to_string();

        let rec = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        self.inner
            .send(rec, Duration::from_secs(10))
            .await
            .map_err(|(e, _msg)| AuthError::InternalError(format!("publish withdrawal: {e}")))?;

        info!(member_id = %member.id, topic = %self.topic, "withdrawal published");
        Ok(())
    }
}
