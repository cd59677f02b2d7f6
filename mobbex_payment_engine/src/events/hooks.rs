use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, WebhookProcessedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub webhook_processed_producer: Vec<EventProducer<WebhookProcessedEvent>>,
}

pub struct EventHandlers {
    pub on_webhook_processed: Option<EventHandler<WebhookProcessedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_webhook_processed = hooks.on_webhook_processed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_webhook_processed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_webhook_processed {
            result.webhook_processed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_webhook_processed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_webhook_processed: Option<Handler<WebhookProcessedEvent>>,
}

impl EventHooks {
    pub fn on_webhook_processed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WebhookProcessedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_webhook_processed = Some(Arc::new(f));
        self
    }
}
