// Copyright 2022, The Android Open Source Project
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Run a FiRa ranging session over the mock transport: build the UWB_CONFIGURATION data object,
//! decode it back, and drive a session with the UCI parameters derived from it.

use log::{error, info};

use uwb_fira::params::{
    DeviceRole, DeviceType, MultiNodeMode, SessionType, SetAppConfigResponse, UwbChannel,
    UwbConfiguration, UwbConfigurationBuilder, UwbMacAddress, UwbSessionState, UwbStatus,
};
use uwb_fira::session::{CallbackStatus, SessionEndReason, UwbPeer, UwbSessionEventCallbacks};
use uwb_fira::tlv::TlvBer;
use uwb_fira::transport::mock_transport::MockUwbTransport;
use uwb_fira::transport::UwbNotification;
use uwb_fira::{Result, UwbDeviceBuilder};

const SESSION_ID: u32 = 0x4321;

struct LoggingCallbacks;

impl UwbSessionEventCallbacks for LoggingCallbacks {
    fn on_session_ended(&mut self, session_id: u32, reason: SessionEndReason) -> CallbackStatus {
        info!("Session {} ended: {:?}", session_id, reason);
        CallbackStatus::Continue
    }

    fn on_ranging_started(&mut self, session_id: u32) -> CallbackStatus {
        info!("Session {} started ranging", session_id);
        CallbackStatus::Continue
    }

    fn on_ranging_stopped(&mut self, session_id: u32) -> CallbackStatus {
        info!("Session {} stopped ranging", session_id);
        CallbackStatus::Continue
    }

    fn on_session_membership_changed(
        &mut self,
        session_id: u32,
        peers_added: &[UwbPeer],
        peers_removed: &[UwbPeer],
    ) -> CallbackStatus {
        info!("Session {} peers: +{:?} -{:?}", session_id, peers_added, peers_removed);
        CallbackStatus::Continue
    }
}

fn run() -> Result<()> {
    let config = UwbConfigurationBuilder::with_defaults()
        .device_role(DeviceRole::Responder)
        .channel(UwbChannel::Channel9)
        .multi_node_mode(MultiNodeMode::Unicast)
        .build();
    let data_object = config.to_data_object()?;
    let encoded = data_object.encode()?;
    info!("UWB_CONFIGURATION: {:02X?}", encoded);
    let decoded = UwbConfiguration::from_data_object(&TlvBer::parse(&encoded)?)?;
    info!("Decoded configuration equals the original: {}", decoded == config);

    let params = decoded.get_uci_config_params();
    for param in params.iter() {
        info!("UCI parameter {}", param);
    }

    let status_notf = |session_state| UwbNotification::SessionStatus {
        session_id: SESSION_ID,
        session_state,
        reason_code: None,
    };
    let mut transport = MockUwbTransport::new();
    transport.expect_session_initialize(
        SESSION_ID,
        SessionType::FiraRangingSession,
        vec![status_notf(UwbSessionState::Init)],
        Ok(()),
    );
    transport.expect_set_application_configuration_parameters(
        SESSION_ID,
        params.clone(),
        vec![status_notf(UwbSessionState::Idle)],
        Ok(SetAppConfigResponse { status: UwbStatus::Ok, config_status: vec![] }),
    );
    transport.expect_session_ranging_start(
        SESSION_ID,
        vec![status_notf(UwbSessionState::Active)],
        Ok(()),
    );
    transport.expect_session_ranging_stop(
        SESSION_ID,
        vec![status_notf(UwbSessionState::Idle)],
        Ok(()),
    );
    transport.expect_session_deinitialize(
        SESSION_ID,
        vec![status_notf(UwbSessionState::Deinit)],
        Ok(()),
    );

    let device = UwbDeviceBuilder::new()
        .name("demo".to_owned())
        .transport(transport)
        .build()
        .ok_or(uwb_fira::Error::BadParameters)?;
    let session =
        device.create_session(SESSION_ID, DeviceType::Controlee, Some(Box::new(LoggingCallbacks)))?;
    session.add_peer(UwbMacAddress::Short([0x12, 0x34]))?;
    session.configure(params)?;
    session.start_ranging()?;
    session.stop_ranging()?;
    session.destroy()?;
    info!("Session {} is {:?}", session.id(), session.state());
    Ok(())
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).init();
    if let Err(e) = run() {
        error!("The demo failed: {}", e);
    }
}
