//! Shared test utilities

use std::sync::{Arc, Mutex};

use brain_sdk::device::{
    AccessorController, ButtonDef, DirectoryController, DirectoryDef, DiscoveryOptions, SliderDef, SwitchDef,
    TextLabelDef,
};
use brain_sdk::list::{ListBuilder, ListItem, ListParams};
use brain_sdk::{DeviceBuilder, DeviceType, DiscoveredDevice, DiscoveryResult};
use serde_json::{Value, json};

/// Calls observed by the sample controllers, as `"kind:device:value"`
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log poisoned").clone()
}

fn record(log: &CallLog, entry: String) {
    log.lock().expect("call log poisoned").push(entry);
}

/// A light with a switch, a slider, a button, a label and a directory
pub fn sample_lamp(log: &CallLog) -> DeviceBuilder {
    let switch_log = log.clone();
    let slider_log = log.clone();
    let button_log = log.clone();
    let action_log = log.clone();

    DeviceBuilder::new("Lamp")
        .manufacturer("Acme")
        .device_type(DeviceType::Light)
        .add_search_token("bulb")
        .add_switch(
            SwitchDef::new("POWER"),
            AccessorController::with_getter(|_| async { Ok(json!(true)) }).setter(
                move |device_id, value| {
                    let log = switch_log.clone();
                    async move {
                        record(&log, format!("switch:{device_id}:{value}"));
                        Ok(())
                    }
                },
            ),
        )
        .add_slider(
            SliderDef::new("BRIGHTNESS").range(0.0, 100.0),
            AccessorController::with_getter(|_| async { Ok(json!(42)) }).setter(
                move |device_id, value| {
                    let log = slider_log.clone();
                    async move {
                        record(&log, format!("slider:{device_id}:{value}"));
                        Ok(())
                    }
                },
            ),
        )
        .add_button(ButtonDef::new("FLASH"))
        .button_handler(move |name, device_id| {
            let log = button_log.clone();
            async move {
                record(&log, format!("button:{device_id}:{name}"));
                Ok(())
            }
        })
        .add_text_label(TextLabelDef::new("MODEL"), |_| async { Ok(json!("A19")) })
        .add_directory(
            DirectoryDef::new("SCENES"),
            DirectoryController::new()
                .getter(|_, params| async move {
                    let list = ListBuilder::new(ListParams::from_browse("Scenes", &params))?
                        .add_list_item(ListItem::new("Evening").action_identifier("evening"))
                        .add_list_item(ListItem::new("Reading").action_identifier("reading"));
                    Ok::<_, anyhow::Error>(Some(list))
                })
                .action(move |device_id, body: Value| {
                    let log = action_log.clone();
                    async move {
                        record(&log, format!("action:{device_id}:{body}"));
                        Ok(())
                    }
                }),
        )
}

/// A bridge that discovers two bulbs
pub fn sample_hub() -> DeviceBuilder {
    DeviceBuilder::new("Hub")
        .manufacturer("Acme")
        .enable_discovery(DiscoveryOptions::default(), |_| async {
            Ok(DiscoveryResult::Many(vec![
                DiscoveredDevice::new("bulb-1", "Kitchen").reachable(true),
                DiscoveredDevice::new("bulb-2", "Hall").room("Hall"),
            ]))
        })
}
