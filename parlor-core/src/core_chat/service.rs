//! Channel service: orchestrates channel, message and presence operations
//! across the store, the event bus and the enrichment pipeline.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle as TaskHandle;
use tracing::{debug, info, warn};

use crate::config::{ChatConfig, Config};
use crate::core_bus::{ChannelSnapshot, ChatEvent, EventBus, SubscriberContext, Subscription};
use crate::core_enrich::{EnrichmentJob, EnrichmentNotice, EnrichmentRunner, HttpFetcher};
use crate::core_store::model::{
    Channel, ChannelId, MemberProfile, Message, MessageId, MessageView, UserId,
};
use crate::core_store::ChatStore;

use super::error::{ChatError, ChatResult, CHANNEL_NOT_FOUND, WRONG_PASSWORD};
use super::join::{JoinAnnouncement, JoinHandle};
use super::{password, validate};

/// Parameters for [`ChatService::create_channel`].
#[derive(Debug, Clone)]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: String,
    pub is_private: bool,
    pub password: Option<String>,
}

/// One page of channel history plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct MessagePage {
    pub total: u64,
    pub messages: Vec<Message>,
}

/// The orchestration layer over store, bus and enrichment queue.
///
/// All operations take the authenticated actor's profile; the service
/// refreshes the profile directory from it so event payloads and member
/// lists can be populated without an external identity lookup.
pub struct ChatService {
    store: ChatStore,
    bus: EventBus,
    config: ChatConfig,
    enrichment: Option<mpsc::Sender<EnrichmentJob>>,
}

impl ChatService {
    pub fn new(store: ChatStore, config: ChatConfig) -> Self {
        let bus = EventBus::new(config.bus_capacity);
        Self {
            store,
            bus,
            config,
            enrichment: None,
        }
    }

    /// Wires the enrichment job queue. Posts made before this is called
    /// skip enrichment entirely.
    pub fn with_enrichment(mut self, jobs: mpsc::Sender<EnrichmentJob>) -> Self {
        self.enrichment = Some(jobs);
        self
    }

    /// Builds the fully-wired service for an embedding host: enrichment
    /// worker pool, notice listener and bus.
    pub fn spawn(store: ChatStore, config: &Config) -> ChatResult<(Arc<Self>, EnrichmentRunner)> {
        if !config.enrichment.enabled {
            info!("enrichment disabled, posted links stay unenriched");
            let service = Arc::new(Self::new(store, config.chat.clone()));
            return Ok((service, EnrichmentRunner::disabled()));
        }

        let fetcher = HttpFetcher::from_config(&config.enrichment)
            .map_err(|e| ChatError::Internal(format!("enrichment fetcher init failed: {}", e)))?;
        let (runner, jobs, notices) =
            EnrichmentRunner::start(store.clone(), Arc::new(fetcher), &config.enrichment);

        let service = Arc::new(Self::new(store, config.chat.clone()).with_enrichment(jobs));
        service.spawn_notice_listener(notices);

        Ok((service, runner))
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub async fn create_channel(
        &self,
        request: CreateChannelRequest,
        actor: &MemberProfile,
    ) -> ChatResult<Channel> {
        validate::channel_name(&request.name)?;
        validate::channel_description(&request.description)?;

        let password_hash = if request.is_private {
            let supplied = request.password.as_deref().unwrap_or("");
            validate::channel_password(supplied, self.config.password_max_len)?;
            Some(password::hash_password(supplied)?)
        } else {
            None
        };

        let actor = self.remember_actor(actor)?;
        let channel = Channel::new(
            request.name,
            request.description,
            password_hash,
            actor.id.clone(),
        );
        self.store.create_channel(&channel)?;

        info!(channel_id = %channel.id, name = %channel.name, "channel created");
        counter!("chat.channels.created").increment(1);

        self.bus.publish(ChatEvent::ChannelCreated {
            member: actor,
            channel: ChannelSnapshot::stripped(&channel),
        });

        Ok(channel)
    }

    /// Every known channel, oldest first. Member sets are populated.
    pub fn list_channels(&self) -> ChatResult<Vec<Channel>> {
        Ok(self.store.list_channels()?)
    }

    pub async fn post_message(
        &self,
        channel_id: &ChannelId,
        body: String,
        actor: &MemberProfile,
    ) -> ChatResult<Message> {
        validate::message_body(&body)?;

        let channel = self
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| ChatError::NotFound(format!("channel {}", channel_id)))?;

        let actor = self.remember_actor(actor)?;
        let message = Message::new(channel.id.clone(), actor.id.clone(), body);
        self.store.insert_message(&message)?;

        debug!(message_id = %message.id, channel = %channel.name, "message posted");
        counter!("chat.messages.posted").increment(1);

        self.bus.publish(ChatEvent::MessagePosted {
            member: actor.clone(),
            channel: ChannelSnapshot::stripped(&channel),
            message: MessageView::from_message(message.clone(), actor),
        });

        self.dispatch_enrichment(&message);

        Ok(message)
    }

    pub async fn list_messages(
        &self,
        channel_id: &ChannelId,
        skip: u64,
        per_page: u64,
        password: Option<&str>,
    ) -> ChatResult<MessagePage> {
        let channel = self
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| ChatError::NotFound(format!("channel {}", channel_id)))?;

        if channel.is_private {
            let supplied = password.unwrap_or("");
            let hash = channel.password_hash.as_deref().unwrap_or("");
            if supplied.is_empty() || !password::verify_password(supplied, hash)? {
                return Err(ChatError::Authentication(WRONG_PASSWORD.to_string()));
            }
        }

        // The total is always recomputed, never cached
        let total = self.store.count_messages(channel_id)?;
        if total == 0 {
            return Ok(MessagePage {
                total,
                messages: Vec::new(),
            });
        }

        let messages = self.store.list_message_page(channel_id, skip, per_page)?;
        Ok(MessagePage { total, messages })
    }

    /// Opens a long-lived subscription on a channel by name.
    ///
    /// Resolution failures are not returned as errors: the handle's stream
    /// yields exactly one targeted `SubscriptionError` and then ends. On
    /// admission the receiver is registered before this returns, and the
    /// returned announcement stays unpublished until the caller passes it
    /// to [`announce_join`](Self::announce_join).
    pub async fn join_channel(
        &self,
        channel_name: &str,
        password: Option<&str>,
        actor: &MemberProfile,
    ) -> ChatResult<JoinHandle> {
        let ctx = SubscriberContext::new(actor.id.clone(), channel_name.to_string());

        let Some(channel) = self.store.get_channel_by_name(channel_name)? else {
            debug!(channel = %channel_name, user_id = %actor.id, "join rejected, unknown channel");
            counter!("chat.joins.rejected", "reason" => "not_found").increment(1);
            return Ok(JoinHandle::rejected(Subscription::rejected(
                ctx,
                CHANNEL_NOT_FOUND.to_string(),
            )));
        };

        if channel.is_private {
            let supplied = password.unwrap_or("");
            let hash = channel.password_hash.as_deref().unwrap_or("");
            if supplied.is_empty() || !password::verify_password(supplied, hash)? {
                debug!(channel = %channel_name, user_id = %actor.id, "join rejected, bad password");
                counter!("chat.joins.rejected", "reason" => "wrong_password").increment(1);
                return Ok(JoinHandle::rejected(Subscription::rejected(
                    ctx,
                    WRONG_PASSWORD.to_string(),
                )));
            }
        }

        let actor = self.remember_actor(actor)?;

        // Register the receiver before any announcement can go out
        let subscription = Subscription::attached(&self.bus, ctx);

        let newly_added = self.store.add_member(&channel.id, &actor.id)?;
        let members = self.store.member_profiles(&channel.id)?;

        if newly_added {
            info!(channel = %channel.name, user_id = %actor.id, "member joined channel");
            counter!("chat.joins.admitted", "membership" => "new").increment(1);
        } else {
            debug!(channel = %channel.name, user_id = %actor.id, "existing member rejoined");
            counter!("chat.joins.admitted", "membership" => "existing").increment(1);
        }

        let announcement = JoinAnnouncement {
            joiner: actor,
            channel: ChannelSnapshot::with_members(&channel, members),
            stripped: ChannelSnapshot::stripped(&channel),
            newly_added,
        };

        Ok(JoinHandle::admitted(subscription, announcement))
    }

    /// Publishes the join broadcast once the caller holds the handle:
    /// `MemberJoined` always, `MemberAdded` only when the member set grew.
    pub fn announce_join(&self, announcement: JoinAnnouncement) {
        let JoinAnnouncement {
            joiner,
            channel,
            stripped,
            newly_added,
        } = announcement;

        self.bus.publish(ChatEvent::MemberJoined {
            member: joiner.clone(),
            channel,
        });

        if newly_added {
            self.bus.publish(ChatEvent::MemberAdded {
                member: joiner,
                channel: stripped,
            });
        }
    }

    /// Flips a member's presence flag and announces it globally. Unknown
    /// members are ignored.
    pub async fn set_status(&self, user_id: &UserId, online: bool) -> ChatResult<()> {
        let Some(profile) = self.store.set_online(user_id, online)? else {
            debug!(user_id = %user_id, "status change for unknown member ignored");
            return Ok(());
        };

        debug!(user_id = %user_id, online, "presence changed");
        self.bus.publish(ChatEvent::StatusChanged { member: profile });
        Ok(())
    }

    /// Turns enrichment completion notices into `MessageUpdated` events.
    ///
    /// The task holds only a weak service handle: dropping the last strong
    /// handle closes the job queue, the workers drain and exit, and this
    /// task ends with them. A strong handle here would keep that chain
    /// alive forever.
    pub fn spawn_notice_listener(
        self: &Arc<Self>,
        mut notices: mpsc::Receiver<EnrichmentNotice>,
    ) -> TaskHandle<()> {
        let service = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                let Some(service) = service.upgrade() else {
                    break;
                };
                if let Err(err) = service.publish_message_updated(&notice.message_id) {
                    warn!(
                        message_id = %notice.message_id,
                        error = %err,
                        "failed to publish message update"
                    );
                }
            }
            debug!("enrichment notice channel closed");
        })
    }

    fn publish_message_updated(&self, message_id: &MessageId) -> ChatResult<()> {
        let message = self
            .store
            .get_message(message_id)?
            .ok_or_else(|| ChatError::NotFound(format!("message {}", message_id)))?;
        let channel = self
            .store
            .get_channel(&message.channel_id)?
            .ok_or_else(|| ChatError::NotFound(format!("channel {}", message.channel_id)))?;
        let view = self
            .store
            .message_view(message_id)?
            .ok_or_else(|| ChatError::NotFound(format!("message {}", message_id)))?;

        counter!("chat.messages.updated").increment(1);
        self.bus.publish(ChatEvent::MessageUpdated {
            member: view.author.clone(),
            channel: ChannelSnapshot::stripped(&channel),
            message: view,
        });
        Ok(())
    }

    /// Fire-and-forget enrichment dispatch. A full queue or stopped worker
    /// drops the job; the post has already succeeded.
    fn dispatch_enrichment(&self, message: &Message) {
        let Some(jobs) = &self.enrichment else {
            return;
        };

        let job = EnrichmentJob {
            message_id: message.id.clone(),
            body: message.body.clone(),
        };
        match jobs.try_send(job) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(message_id = %message.id, "enrichment queue full, dropping job");
                counter!("enrich.jobs.dropped", "reason" => "queue_full").increment(1);
            }
            Err(TrySendError::Closed(_)) => {
                warn!(message_id = %message.id, "enrichment queue closed, dropping job");
                counter!("enrich.jobs.dropped", "reason" => "queue_closed").increment(1);
            }
        }
    }

    /// Keeps the profile directory current and returns the stored view of
    /// the actor, presence included.
    fn remember_actor(&self, actor: &MemberProfile) -> ChatResult<MemberProfile> {
        self.store.upsert_profile(actor)?;
        Ok(self
            .store
            .get_profile(&actor.id)?
            .unwrap_or_else(|| actor.clone()))
    }
}
