//! A scripted ASPSP for tests. Each SPI method answers from its own queue of canned responses, in order.
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use xs2a_common::Secret;

use crate::{
    db_types::PsuIdData,
    spi::{
        AuthorisationCodeResult,
        AuthorisationSpi,
        AvailableScaMethods,
        DecoupledScaResult,
        PsuAuthorisationResult,
        ScaVerification,
        SpiContext,
        SpiError,
        SpiResponse,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMethod {
    AuthorisePsu,
    RequestAvailableScaMethods,
    RequestAuthorisationCode,
    StartScaDecoupled,
    VerifyScaAuthorisation,
}

/// A record of one SPI call.
#[derive(Debug, Clone)]
pub struct SpiCall {
    pub method: SpiMethod,
    pub context: SpiContext,
    /// The plaintext session data the engine handed to the call.
    pub session_data: Vec<u8>,
    /// The password, method id or OTP passed in, if any.
    pub argument: Option<String>,
}

#[derive(Debug, Default)]
struct Script {
    psu: VecDeque<SpiResponse<PsuAuthorisationResult>>,
    methods: VecDeque<SpiResponse<AvailableScaMethods>>,
    codes: VecDeque<SpiResponse<AuthorisationCodeResult>>,
    decoupled: VecDeque<SpiResponse<DecoupledScaResult>>,
    verifications: VecDeque<SpiResponse<ScaVerification>>,
    calls: Vec<SpiCall>,
}

/// When a queue runs dry the call fails with [`SpiError::Unavailable`].
#[derive(Debug, Default)]
pub struct ScriptedSpi {
    script: Mutex<Script>,
    delay: Option<Duration>,
}

impl ScriptedSpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_psu_result(&self, response: SpiResponse<PsuAuthorisationResult>) -> &Self {
        self.script().psu.push_back(response);
        self
    }

    pub fn push_sca_methods(&self, response: SpiResponse<AvailableScaMethods>) -> &Self {
        self.script().methods.push_back(response);
        self
    }

    pub fn push_authorisation_code(&self, response: SpiResponse<AuthorisationCodeResult>) -> &Self {
        self.script().codes.push_back(response);
        self
    }

    pub fn push_decoupled_start(&self, response: SpiResponse<DecoupledScaResult>) -> &Self {
        self.script().decoupled.push_back(response);
        self
    }

    pub fn push_verification(&self, response: SpiResponse<ScaVerification>) -> &Self {
        self.script().verifications.push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<SpiCall> {
        self.script().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }

    async fn answer<T, F>(&self, call: SpiCall, pick: F) -> SpiResponse<T>
    where F: FnOnce(&mut Script) -> Option<SpiResponse<T>> {
        let method = call.method;
        let response = {
            let mut script = self.script();
            script.calls.push(call);
            pick(&mut script)
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response.unwrap_or_else(|| SpiResponse::error(SpiError::Unavailable(format!("No scripted answer for {method:?}"))))
    }
}

impl AuthorisationSpi for ScriptedSpi {
    async fn authorise_psu(
        &self,
        ctx: &SpiContext,
        _psu: &PsuIdData,
        password: &Secret<String>,
        session_data: &[u8],
    ) -> SpiResponse<PsuAuthorisationResult> {
        let call = SpiCall {
            method: SpiMethod::AuthorisePsu,
            context: ctx.clone(),
            session_data: session_data.to_vec(),
            argument: Some(password.reveal().clone()),
        };
        self.answer(call, |s| s.psu.pop_front()).await
    }

    async fn request_available_sca_methods(
        &self,
        ctx: &SpiContext,
        session_data: &[u8],
    ) -> SpiResponse<AvailableScaMethods> {
        let call = SpiCall {
            method: SpiMethod::RequestAvailableScaMethods,
            context: ctx.clone(),
            session_data: session_data.to_vec(),
            argument: None,
        };
        self.answer(call, |s| s.methods.pop_front()).await
    }

    async fn request_authorisation_code(
        &self,
        ctx: &SpiContext,
        authentication_method_id: &str,
        session_data: &[u8],
    ) -> SpiResponse<AuthorisationCodeResult> {
        let call = SpiCall {
            method: SpiMethod::RequestAuthorisationCode,
            context: ctx.clone(),
            session_data: session_data.to_vec(),
            argument: Some(authentication_method_id.to_string()),
        };
        self.answer(call, |s| s.codes.pop_front()).await
    }

    async fn start_sca_decoupled(
        &self,
        ctx: &SpiContext,
        authentication_method_id: Option<String>,
        session_data: &[u8],
    ) -> SpiResponse<DecoupledScaResult> {
        let call = SpiCall {
            method: SpiMethod::StartScaDecoupled,
            context: ctx.clone(),
            session_data: session_data.to_vec(),
            argument: authentication_method_id,
        };
        self.answer(call, |s| s.decoupled.pop_front()).await
    }

    async fn verify_sca_authorisation(
        &self,
        ctx: &SpiContext,
        sca_authentication_data: &Secret<String>,
        session_data: &[u8],
    ) -> SpiResponse<ScaVerification> {
        let call = SpiCall {
            method: SpiMethod::VerifyScaAuthorisation,
            context: ctx.clone(),
            session_data: session_data.to_vec(),
            argument: Some(sca_authentication_data.reveal().clone()),
        };
        self.answer(call, |s| s.verifications.pop_front()).await
    }
}
