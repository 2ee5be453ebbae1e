use inbox_core::InboxContext;
use inbox_service::InboxService;

#[derive(Clone)]
pub struct ApiState {
    pub ctx: InboxContext,
    pub service: InboxService,
}

impl ApiState {
    pub fn new(ctx: InboxContext) -> Self {
        let service = InboxService::from_context(&ctx);
        Self { ctx, service }
    }
}
