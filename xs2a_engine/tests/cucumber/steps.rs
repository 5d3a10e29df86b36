use cucumber::{given, then, when};
use xs2a_engine::{
    db_types::{
        AuthenticationObject,
        AuthorisationKind,
        MessageErrorCode,
        PsuIdData,
        ResourceStatus,
        ScaApproach,
        ScaStatus,
        ServiceType,
    },
    sca::NextStep,
    spi::{
        AuthorisationCodeResult,
        AvailableScaMethods,
        DecoupledScaResult,
        PsuAuthorisationResult,
        ScaVerification,
        SpiAuthorisationStatus,
        SpiResponse,
    },
    ResourceManagement,
    ScaInput,
};

use crate::cucumber::{
    sca_world::{default_config, ScaSystem},
    ScaWorld,
};

#[given("a fresh SCA system")]
async fn fresh_system(world: &mut ScaWorld) {
    world.system = Some(ScaSystem::new(default_config()).await);
}

#[given("a fresh SCA system with exemptions disabled")]
async fn fresh_system_without_exemptions(world: &mut ScaWorld) {
    let mut config = default_config();
    config.exemptions_enabled = false;
    world.system = Some(ScaSystem::new(config).await);
}

#[given(expr = "the {word} resource '{word}' is registered")]
async fn register_resource(world: &mut ScaWorld, service_type: String, internal_id: String) {
    let service_type = service_type.parse::<ServiceType>().expect("Unknown service type");
    let (encrypted_id, _) =
        world.system().resources().register_resource(&internal_id, service_type).await.expect("Error registering");
    world.identifiers.insert(internal_id, encrypted_id);
}

#[given(expr = "session data '{word}' is attached to '{word}'")]
async fn attach_session_data(world: &mut ScaWorld, data: String, internal_id: String) {
    let encrypted_id = world.identifier(&internal_id).clone();
    world
        .system()
        .resources()
        .attach_session_data(encrypted_id.as_str(), data.as_bytes())
        .await
        .expect("Error attaching session data");
}

#[given(expr = "a(n) {word} authorisation is started for '{word}' with the {word} approach")]
async fn start_authorisation(world: &mut ScaWorld, kind: String, internal_id: String, approach: String) {
    let kind = kind.parse::<AuthorisationKind>().expect("Unknown authorisation kind");
    let approach = approach.parse::<ScaApproach>().expect("Unknown SCA approach");
    let encrypted_id = world.identifier(&internal_id).clone();
    let auth = world
        .system()
        .authorisations()
        .start_authorisation(encrypted_id.as_str(), kind, approach, PsuIdData::default())
        .await
        .expect("Error starting authorisation");
    world.authorisation = Some(auth);
}

//-----------------------------------------  The scripted ASPSP  --------------------------------------------------------

#[given("the ASPSP accepts the password")]
async fn aspsp_accepts_password(world: &mut ScaWorld) {
    world.system().spi.push_psu_result(SpiResponse::success(PsuAuthorisationResult::new(SpiAuthorisationStatus::Success)));
}

#[given("the ASPSP accepts the password and exempts the PSU from SCA")]
async fn aspsp_exempts_at_login(world: &mut ScaWorld) {
    let mut result = PsuAuthorisationResult::new(SpiAuthorisationStatus::Success);
    result.sca_exempted = true;
    world.system().spi.push_psu_result(SpiResponse::success(result));
}

#[given(expr = "the ASPSP rejects the password and returns session data '{word}'")]
async fn aspsp_rejects_password(world: &mut ScaWorld, data: String) {
    let response = SpiResponse::success(PsuAuthorisationResult::new(SpiAuthorisationStatus::Failure))
        .with_session_data(data.into_bytes());
    world.system().spi.push_psu_result(response);
}

#[given("the ASPSP rejects the password but allows another attempt")]
async fn aspsp_allows_retry(world: &mut ScaWorld) {
    world
        .system()
        .spi
        .push_psu_result(SpiResponse::success(PsuAuthorisationResult::new(SpiAuthorisationStatus::AttemptFailure)));
}

#[given(expr = "the ASPSP offers the SCA methods {string}")]
async fn aspsp_offers_methods(world: &mut ScaWorld, methods: String) {
    let methods = xs2a_common::helpers::split_list(&methods)
        .into_iter()
        .map(|id| AuthenticationObject::new(id, "SMS_OTP"))
        .collect::<Vec<_>>();
    world.system().spi.push_sca_methods(SpiResponse::success(AvailableScaMethods::new(methods)));
}

#[given(expr = "the ASPSP offers the SCA methods {string}, where '{word}' is decoupled")]
async fn aspsp_offers_decoupled_method(world: &mut ScaWorld, methods: String, decoupled: String) {
    let methods = xs2a_common::helpers::split_list(&methods)
        .into_iter()
        .map(|id| {
            let method = AuthenticationObject::new(id.clone(), "PUSH_OTP");
            if id == decoupled {
                method.decoupled()
            } else {
                method
            }
        })
        .collect::<Vec<_>>();
    world.system().spi.push_sca_methods(SpiResponse::success(AvailableScaMethods::new(methods)));
}

#[given(expr = "the ASPSP starts decoupled SCA with the message {string}")]
async fn aspsp_starts_decoupled(world: &mut ScaWorld, message: String) {
    let result = DecoupledScaResult { psu_message: Some(message) };
    world.system().spi.push_decoupled_start(SpiResponse::success(result));
}

#[given("the ASPSP offers no SCA methods")]
async fn aspsp_offers_no_methods(world: &mut ScaWorld) {
    world.system().spi.push_sca_methods(SpiResponse::success(AvailableScaMethods::new(vec![])));
}

#[given("the ASPSP sends a challenge")]
async fn aspsp_sends_challenge(world: &mut ScaWorld) {
    let result = AuthorisationCodeResult { selected_method: None, challenge: None, sca_exempted: false };
    world.system().spi.push_authorisation_code(SpiResponse::success(result));
}

#[given("the ASPSP accepts the OTP")]
async fn aspsp_accepts_otp(world: &mut ScaWorld) {
    let result = ScaVerification { status: SpiAuthorisationStatus::Success, resource_status: None };
    world.system().spi.push_verification(SpiResponse::success(result));
}

#[given("the ASPSP rejects the OTP")]
async fn aspsp_rejects_otp(world: &mut ScaWorld) {
    let result = ScaVerification { status: SpiAuthorisationStatus::Failure, resource_status: None };
    world.system().spi.push_verification(SpiResponse::success(result));
}

//-----------------------------------------     PSU updates     --------------------------------------------------------

async fn send_update(world: &mut ScaWorld, build: impl FnOnce(ScaInput) -> ScaInput) {
    let auth = world.authorisation().clone();
    let input = build(ScaInput::for_kind(auth.authorisation_kind));
    let response = world
        .system()
        .dispatcher
        .process_update(&auth.authorisation_id, input)
        .await
        .expect("Error processing update");
    world.last_response = Some(response);
}

#[when(expr = "the PSU identifies as '{word}'")]
async fn psu_identifies(world: &mut ScaWorld, psu_id: String) {
    send_update(world, |input| input.with_psu(PsuIdData::new(psu_id))).await;
}

#[when(expr = "the PSU '{word}' logs in with password '{word}'")]
async fn psu_logs_in(world: &mut ScaWorld, psu_id: String, password: String) {
    send_update(world, |input| input.with_psu(PsuIdData::new(psu_id)).with_password(password)).await;
}

#[when(expr = "the PSU logs in with password '{word}'")]
async fn identified_psu_logs_in(world: &mut ScaWorld, password: String) {
    send_update(world, |input| input.with_password(password)).await;
}

#[when(expr = "the PSU selects the SCA method '{word}'")]
async fn psu_selects_method(world: &mut ScaWorld, method_id: String) {
    send_update(world, |input| input.with_authentication_method(method_id)).await;
}

#[when(expr = "the PSU sends the OTP '{word}'")]
async fn psu_sends_otp(world: &mut ScaWorld, otp: String) {
    send_update(world, |input| input.with_sca_authentication_data(otp)).await;
}

//-----------------------------------------      Outcomes       --------------------------------------------------------

#[then(expr = "the SCA status is {word}")]
async fn check_status(world: &mut ScaWorld, status: String) {
    let status = status.parse::<ScaStatus>().expect("Unknown SCA status");
    assert_eq!(world.response().sca_status, status, "Response status is incorrect");
    let stored = world.system().authorisations().fetch_authorisation(&world.authorisation().authorisation_id).await;
    let stored = stored.expect("Error fetching authorisation").expect("Authorisation does not exist");
    assert_eq!(stored.sca_status, status, "Stored status is incorrect");
}

#[then(expr = "the error code is {word}")]
async fn check_error_code(world: &mut ScaWorld, code: String) {
    let code = code.parse::<MessageErrorCode>().expect("Unknown error code");
    assert_eq!(world.response().error_code, Some(code));
}

#[then("there is no error code")]
async fn check_no_error_code(world: &mut ScaWorld) {
    assert_eq!(world.response().error_code, None);
}

#[then(expr = "{int} SCA methods are offered")]
async fn check_methods_offered(world: &mut ScaWorld, count: usize) {
    assert_eq!(world.response().available_sca_methods.len(), count);
}

#[then(expr = "the chosen SCA method is '{word}'")]
async fn check_chosen_method(world: &mut ScaWorld, method_id: String) {
    let chosen = world.response().chosen_sca_method.as_ref().map(|m| m.authentication_method_id.as_str());
    assert_eq!(chosen, Some(method_id.as_str()));
}

#[then(expr = "the PSU is told {string} and confirms in the bank app")]
async fn check_decoupled(world: &mut ScaWorld, message: String) {
    let response = world.response();
    assert_eq!(response.next_step, Some(NextStep::AuthoriseInBankApp));
    assert_eq!(response.psu_message.as_deref(), Some(message.as_str()));
    assert_eq!(response.challenge_data, None);
    let stored = world.system().authorisations().fetch_authorisation(&world.authorisation().authorisation_id).await;
    let stored = stored.expect("Error fetching authorisation").expect("Authorisation does not exist");
    assert_eq!(stored.sca_approach, ScaApproach::Decoupled);
}

#[then(expr = "the resource '{word}' has status {word}")]
async fn check_resource_status(world: &mut ScaWorld, internal_id: String, status: String) {
    let status = status.parse::<ResourceStatus>().expect("Unknown resource status");
    let resource = world.system().db.fetch_resource(&internal_id).await.expect("Error fetching resource");
    assert_eq!(resource.expect("Resource does not exist").status, status);
}

#[then(expr = "the session data of '{word}' is '{word}'")]
async fn check_session_data(world: &mut ScaWorld, internal_id: String, expected: String) {
    let encrypted_id = world.identifier(&internal_id).clone();
    let system = world.system();
    let data = system.db.fetch_session_data(encrypted_id.as_str()).await.expect("Error fetching session data");
    let data = data.expect("No session data stored");
    let data = system.codec.decrypt_session_data(encrypted_id.as_str(), &data).expect("Session data is unreadable");
    assert_eq!(data.as_bytes(), expected.as_bytes());
}

#[then(expr = "the ASPSP was called {int} times")]
async fn check_spi_calls(world: &mut ScaWorld, count: usize) {
    assert_eq!(world.system().spi.call_count(), count);
}
