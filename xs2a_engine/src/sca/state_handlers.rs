//! One handler per SCA status.
//!
//! The dispatcher picks the handler with an exhaustive `match` on the current status, so adding a status without a
//! handler does not compile. Each handler checks that the authorisation really is in its status before delegating
//! to the matching `do_sca_*` method of the processor service.
use log::*;

use crate::{
    db_types::ScaStatus,
    sca::{
        context::ScaContext,
        errors::ProcessorError,
        objects::AuthorisationProcessorResponse,
        AuthorisationProcessorService,
    },
    spi::AuthorisationSpi,
};

#[allow(async_fn_in_trait)]
pub trait ScaStateHandler {
    /// The only status this handler accepts.
    const STATUS: ScaStatus;

    async fn handle<P, S>(
        processor: &P,
        ctx: &mut ScaContext<'_, S>,
    ) -> Result<AuthorisationProcessorResponse, ProcessorError>
    where
        P: AuthorisationProcessorService,
        S: AuthorisationSpi;
}

macro_rules! state_handler {
    ($name:ident, $status:expr, async $method:ident) => {
        pub struct $name;

        impl ScaStateHandler for $name {
            const STATUS: ScaStatus = $status;

            async fn handle<P, S>(
                processor: &P,
                ctx: &mut ScaContext<'_, S>,
            ) -> Result<AuthorisationProcessorResponse, ProcessorError>
            where
                P: AuthorisationProcessorService,
                S: AuthorisationSpi,
            {
                processor.$method(ctx).await
            }
        }
    };
    ($name:ident, $status:expr, pure $method:ident) => {
        pub struct $name;

        impl ScaStateHandler for $name {
            const STATUS: ScaStatus = $status;

            async fn handle<P, S>(
                processor: &P,
                ctx: &mut ScaContext<'_, S>,
            ) -> Result<AuthorisationProcessorResponse, ProcessorError>
            where
                P: AuthorisationProcessorService,
                S: AuthorisationSpi,
            {
                Ok(processor.$method(ctx))
            }
        }
    };
}

state_handler!(ReceivedStateHandler, ScaStatus::Received, async do_sca_received);
state_handler!(PsuIdentifiedStateHandler, ScaStatus::PsuIdentified, async do_sca_psu_identified);
state_handler!(PsuAuthenticatedStateHandler, ScaStatus::PsuAuthenticated, async do_sca_psu_authenticated);
state_handler!(ScaMethodSelectedStateHandler, ScaStatus::ScaMethodSelected, async do_sca_method_selected);
state_handler!(StartedStateHandler, ScaStatus::Started, async do_sca_started);
state_handler!(FinalisedStateHandler, ScaStatus::Finalised, pure do_sca_finalised);
state_handler!(FailedStateHandler, ScaStatus::Failed, pure do_sca_failed);
state_handler!(ExemptedStateHandler, ScaStatus::Exempted, pure do_sca_exempted);

async fn run<H, P, S>(processor: &P, ctx: &mut ScaContext<'_, S>) -> Result<AuthorisationProcessorResponse, ProcessorError>
where
    H: ScaStateHandler,
    P: AuthorisationProcessorService,
    S: AuthorisationSpi,
{
    let actual = ctx.authorisation().sca_status;
    if actual != H::STATUS {
        error!("🔄️ The {} handler was handed an authorisation in status {actual}", H::STATUS);
        return Err(ProcessorError::HandlerStatusMismatch { handler: H::STATUS, actual });
    }
    trace!("🔄️ Handling authorisation {} in status {actual}", ctx.authorisation().authorisation_id);
    H::handle(processor, ctx).await
}

/// Runs the single handler that owns `status`.
pub async fn handle_status<P, S>(
    status: ScaStatus,
    processor: &P,
    ctx: &mut ScaContext<'_, S>,
) -> Result<AuthorisationProcessorResponse, ProcessorError>
where
    P: AuthorisationProcessorService,
    S: AuthorisationSpi,
{
    match status {
        ScaStatus::Received => run::<ReceivedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::PsuIdentified => run::<PsuIdentifiedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::PsuAuthenticated => run::<PsuAuthenticatedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::ScaMethodSelected => run::<ScaMethodSelectedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::Started => run::<StartedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::Finalised => run::<FinalisedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::Failed => run::<FailedStateHandler, _, _>(processor, ctx).await,
        ScaStatus::Exempted => run::<ExemptedStateHandler, _, _>(processor, ctx).await,
    }
}
