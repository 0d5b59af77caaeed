//! Request dispatcher
//!
//! Routes an inbound get, set or action to the controller registered for a
//! component and normalizes its result. The dispatch table is keyed by the
//! component type; a controller of the wrong shape is reported the same way
//! as a missing callback.

pub mod discovery;

use std::sync::Arc;

use serde_json::{Value, json};

pub use discovery::{DiscoveredDevice, DiscoveredEntry, DiscoveryResult, DynamicDeviceRegistrar};

use crate::capability::{CapabilityHandler, ComponentType};
use crate::device::Controller;
use crate::device::controller::SubscriptionController;
use crate::list::BrowseParams;
use crate::{Error, Result};

/// Inbound read of a component value
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub handler: Option<Arc<CapabilityHandler>>,
    pub device_id: String,
    /// Browse parameters, used by directories
    pub browse: Option<BrowseParams>,
}

/// Inbound write of a component value
#[derive(Debug, Clone)]
pub struct SetRequest {
    pub handler: Option<Arc<CapabilityHandler>>,
    pub device_id: String,
    pub value: String,
}

/// Inbound directory action
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub handler: Option<Arc<CapabilityHandler>>,
    pub device_id: String,
    pub body: Value,
}

/// Inbound discovery call
#[derive(Debug, Clone)]
pub struct DiscoverRequest {
    pub handler: Option<Arc<CapabilityHandler>>,
    pub adapter_name: String,
    /// Set when the brain asks about one specific device
    pub device_id: Option<String>,
}

fn success() -> Value {
    json!({ "success": true })
}

fn not_callable(name: &str) -> Error {
    Error::ControllerNotAFunction(name.to_string())
}

/// Dispatches inbound requests to user controllers
#[derive(Clone)]
pub struct RequestDispatcher {
    registrar: Arc<dyn DynamicDeviceRegistrar>,
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher").finish_non_exhaustive()
    }
}

impl RequestDispatcher {
    /// Create a dispatcher handing dynamic devices to `registrar`
    #[must_use]
    pub fn new(registrar: Arc<dyn DynamicDeviceRegistrar>) -> Self {
        Self { registrar }
    }

    /// Read a component value
    ///
    /// # Errors
    ///
    /// Returns `INVALID_GET_PARAMETER`, `INVALID_GET_COMPONENT`,
    /// `CONTROLLER_IS_NOT_A_FUNCTION`, `DIRECTORY_NO_BROWSERESULT_RETURNED_FROM_GETTER`
    /// or the controller's own failure
    pub async fn handle_get(&self, request: GetRequest) -> Result<Value> {
        let handler = request.handler.ok_or(Error::InvalidGetParameter)?;
        let device_id = request.device_id;

        match handler.component_type {
            ComponentType::Button => {
                let Controller::Function(f) = &handler.controller else {
                    return Err(not_callable(handler.controller.shape()));
                };
                f(device_id).await.map_err(Error::Controller)?;
                Ok(success())
            }
            ComponentType::TextLabel | ComponentType::ImageUrl => {
                let Controller::Function(f) = &handler.controller else {
                    return Err(not_callable(handler.controller.shape()));
                };
                let value = f(device_id).await.map_err(Error::Controller)?;
                Ok(json!({ "value": value }))
            }
            ComponentType::Sensor | ComponentType::Slider | ComponentType::Switch => {
                let Controller::Accessor(accessor) = &handler.controller else {
                    return Err(not_callable(handler.controller.shape()));
                };
                let getter = accessor.getter.as_ref().ok_or_else(|| not_callable("getter"))?;
                let value = getter(device_id).await.map_err(Error::Controller)?;
                Ok(json!({ "value": value }))
            }
            ComponentType::Directory => {
                let Controller::Directory(directory) = &handler.controller else {
                    return Err(not_callable(handler.controller.shape()));
                };
                let getter = directory.getter.as_ref().ok_or_else(|| not_callable("getter"))?;
                let list = getter(device_id, request.browse.unwrap_or_default())
                    .await
                    .map_err(Error::Controller)?
                    .ok_or(Error::DirectoryNoBrowseResult)?;
                Ok(serde_json::to_value(list)?)
            }
            other => Err(Error::InvalidGetComponent(other.to_string())),
        }
    }

    /// Write a component value
    ///
    /// Switch values are coerced to a boolean (`"true"` is true, anything
    /// else false); slider values are passed through as received.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_SET_PARAMETER`, `INVALID_SET_COMPONENT`,
    /// `CONTROLLER_IS_NOT_A_FUNCTION` or the controller's own failure
    pub async fn handle_set(&self, request: SetRequest) -> Result<Value> {
        let handler = request.handler.ok_or(Error::InvalidSetParameter)?;

        let value = match handler.component_type {
            ComponentType::Switch => Value::Bool(request.value == "true"),
            ComponentType::Slider => Value::String(request.value),
            other => return Err(Error::InvalidSetComponent(other.to_string())),
        };

        let Controller::Accessor(accessor) = &handler.controller else {
            return Err(not_callable(handler.controller.shape()));
        };
        let setter = accessor.setter.as_ref().ok_or_else(|| not_callable("setter"))?;
        setter(request.device_id, value)
            .await
            .map_err(Error::Controller)?;
        Ok(success())
    }

    /// Run a directory action
    ///
    /// # Errors
    ///
    /// Returns `INVALID_ACTION_PARAMETER`, `INVALID_ACTION_COMPONENT`,
    /// `CONTROLLER_IS_NOT_A_FUNCTION` or the controller's own failure
    pub async fn handle_action(&self, request: ActionRequest) -> Result<Value> {
        let handler = request.handler.ok_or(Error::InvalidActionParameter)?;
        if handler.component_type != ComponentType::Directory {
            return Err(Error::InvalidActionComponent(
                handler.component_type.to_string(),
            ));
        }

        let Controller::Directory(directory) = &handler.controller else {
            return Err(not_callable(handler.controller.shape()));
        };
        let action = directory.action.as_ref().ok_or_else(|| not_callable("action"))?;
        action(request.device_id, request.body)
            .await
            .map_err(Error::Controller)?;
        Ok(success())
    }

    /// Run the adapter's discovery controller
    ///
    /// # Errors
    ///
    /// Returns `INVALID_GET_PARAMETER` without a discover handler,
    /// `CONTROLLER_IS_NOT_A_FUNCTION` for a wrong controller, or a
    /// discovery-result validation error
    pub async fn discover(&self, request: DiscoverRequest) -> Result<Vec<DiscoveredEntry>> {
        let handler = request.handler.ok_or(Error::InvalidGetParameter)?;
        let Controller::Discovery(discover) = &handler.controller else {
            return Err(not_callable(handler.controller.shape()));
        };

        let targeted = request.device_id.is_some();
        let result = discover(request.device_id)
            .await
            .map_err(Error::Controller)?;
        let devices = discovery::validate(result, targeted)?;

        tracing::debug!(
            adapter = %request.adapter_name,
            devices = devices.len(),
            "discovery completed"
        );
        discovery::normalize(devices, &request.adapter_name, self.registrar.as_ref()).await
    }

    /// Ask the adapter whether it is registered
    ///
    /// # Errors
    ///
    /// Returns `INVALID_GET_PARAMETER` without a register handler or
    /// `CONTROLLER_IS_NOT_A_FUNCTION` without an `is_registered` callback
    pub async fn is_registered(&self, handler: Option<Arc<CapabilityHandler>>) -> Result<Value> {
        let handler = handler.ok_or(Error::InvalidGetParameter)?;
        let Controller::Registration(registration) = &handler.controller else {
            return Err(not_callable(handler.controller.shape()));
        };
        let is_registered = registration
            .is_registered
            .as_ref()
            .ok_or_else(|| not_callable("isRegistered"))?;
        let registered = is_registered().await.map_err(Error::Controller)?;
        Ok(json!({ "registered": registered }))
    }

    /// Forward registration credentials to the adapter
    ///
    /// # Errors
    ///
    /// Returns `INVALID_ACTION_PARAMETER` without a register handler or
    /// `CONTROLLER_IS_NOT_A_FUNCTION` without a `register` callback
    pub async fn register(
        &self,
        handler: Option<Arc<CapabilityHandler>>,
        credentials: Value,
    ) -> Result<Value> {
        let handler = handler.ok_or(Error::InvalidActionParameter)?;
        let Controller::Registration(registration) = &handler.controller else {
            return Err(not_callable(handler.controller.shape()));
        };
        let register = registration
            .register
            .as_ref()
            .ok_or_else(|| not_callable("register"))?;
        register(credentials).await.map_err(Error::Controller)
    }

    /// Tell the adapter the brain started using a device
    ///
    /// # Errors
    ///
    /// Returns `CONTROLLER_IS_NOT_A_FUNCTION` without a `device_added` callback
    pub async fn device_added(
        &self,
        handler: Option<Arc<CapabilityHandler>>,
        device_id: String,
    ) -> Result<Value> {
        let subscription = subscription(handler.as_deref())?;
        let added = subscription
            .device_added
            .as_ref()
            .ok_or_else(|| not_callable("deviceAdded"))?;
        added(device_id).await.map_err(Error::Controller)?;
        Ok(success())
    }

    /// Tell the adapter the brain stopped using a device
    ///
    /// # Errors
    ///
    /// Returns `CONTROLLER_IS_NOT_A_FUNCTION` without a `device_removed` callback
    pub async fn device_removed(
        &self,
        handler: Option<Arc<CapabilityHandler>>,
        device_id: String,
    ) -> Result<Value> {
        let subscription = subscription(handler.as_deref())?;
        let removed = subscription
            .device_removed
            .as_ref()
            .ok_or_else(|| not_callable("deviceRemoved"))?;
        removed(device_id).await.map_err(Error::Controller)?;
        Ok(success())
    }
}

fn subscription(handler: Option<&CapabilityHandler>) -> Result<&SubscriptionController> {
    let handler = handler.ok_or(Error::InvalidGetParameter)?;
    match &handler.controller {
        Controller::Subscription(c) => Ok(c),
        other => Err(not_callable(other.shape())),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::device::controller::value_fn;
    use crate::device::{
        AccessorController, DeviceAdapter, DirectoryController, RegistrationController,
    };
    use crate::list::{ListBuilder, ListItem, ListParams};

    struct NoopRegistrar;

    #[async_trait]
    impl DynamicDeviceRegistrar for NoopRegistrar {
        async fn register_dynamic_device(&self, _device_id: &str, _adapter: DeviceAdapter) {}
    }

    fn dispatcher() -> RequestDispatcher {
        RequestDispatcher::new(Arc::new(NoopRegistrar))
    }

    fn handler(kind: ComponentType, controller: Controller) -> Option<Arc<CapabilityHandler>> {
        Some(Arc::new(CapabilityHandler::new(kind, controller)))
    }

    fn get(handler: Option<Arc<CapabilityHandler>>) -> GetRequest {
        GetRequest {
            handler,
            device_id: "d1".into(),
            browse: None,
        }
    }

    #[tokio::test]
    async fn switch_set_coerces_to_bool() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let controller = AccessorController::new().setter(move |device_id, value| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((device_id, value));
                Ok(())
            }
        });

        let result = dispatcher()
            .handle_set(SetRequest {
                handler: handler(ComponentType::Switch, Controller::Accessor(controller)),
                device_id: "d1".into(),
                value: "true".into(),
            })
            .await
            .unwrap();

        assert_eq!(result, json!({ "success": true }));
        assert_eq!(rx.recv().await.unwrap(), ("d1".to_string(), Value::Bool(true)));
    }

    #[tokio::test]
    async fn slider_set_passes_raw_value() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let controller = AccessorController::new().setter(move |_, value| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(value);
                Ok(())
            }
        });

        dispatcher()
            .handle_set(SetRequest {
                handler: handler(ComponentType::Slider, Controller::Accessor(controller)),
                device_id: "d1".into(),
                value: "42".into(),
            })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), Some(json!("42")));
    }

    #[tokio::test]
    async fn missing_handler_is_a_parameter_error() {
        let d = dispatcher();
        assert_eq!(
            d.handle_get(get(None)).await.unwrap_err().code(),
            "INVALID_GET_PARAMETER"
        );
        let set = SetRequest {
            handler: None,
            device_id: "d1".into(),
            value: "1".into(),
        };
        assert_eq!(
            d.handle_set(set).await.unwrap_err().code(),
            "INVALID_SET_PARAMETER"
        );
        let action = ActionRequest {
            handler: None,
            device_id: "d1".into(),
            body: Value::Null,
        };
        assert_eq!(
            d.handle_action(action).await.unwrap_err().code(),
            "INVALID_ACTION_PARAMETER"
        );
    }

    #[tokio::test]
    async fn getters_wrap_value() {
        let label = handler(
            ComponentType::TextLabel,
            Controller::Function(value_fn(|_| async { Ok(json!("Now playing")) })),
        );
        assert_eq!(
            dispatcher().handle_get(get(label)).await.unwrap(),
            json!({ "value": "Now playing" })
        );

        let sensor = handler(
            ComponentType::Sensor,
            Controller::Accessor(AccessorController::with_getter(|_| async { Ok(json!(7)) })),
        );
        assert_eq!(
            dispatcher().handle_get(get(sensor)).await.unwrap(),
            json!({ "value": 7 })
        );
    }

    #[tokio::test]
    async fn button_get_acknowledges() {
        let button = handler(
            ComponentType::Button,
            Controller::Function(value_fn(|_| async { Ok(Value::Null) })),
        );
        assert_eq!(
            dispatcher().handle_get(get(button)).await.unwrap(),
            json!({ "success": true })
        );
    }

    #[tokio::test]
    async fn wrong_controller_shape_is_not_callable() {
        let sensor = handler(
            ComponentType::Sensor,
            Controller::Function(value_fn(|_| async { Ok(json!(1)) })),
        );
        let err = dispatcher().handle_get(get(sensor)).await.unwrap_err();
        assert_eq!(err.code(), "CONTROLLER_IS_NOT_A_FUNCTION");

        let no_setter = handler(
            ComponentType::Switch,
            Controller::Accessor(AccessorController::with_getter(|_| async { Ok(json!(1)) })),
        );
        let err = dispatcher()
            .handle_set(SetRequest {
                handler: no_setter,
                device_id: "d1".into(),
                value: "true".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONTROLLER_IS_NOT_A_FUNCTION");
    }

    #[tokio::test]
    async fn unsupported_components_are_rejected() {
        let label = handler(
            ComponentType::TextLabel,
            Controller::Function(value_fn(|_| async { Ok(json!("x")) })),
        );
        let err = dispatcher()
            .handle_set(SetRequest {
                handler: label.clone(),
                device_id: "d1".into(),
                value: "x".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_SET_COMPONENT");

        let err = dispatcher()
            .handle_action(ActionRequest {
                handler: label,
                device_id: "d1".into(),
                body: Value::Null,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ACTION_COMPONENT");

        let register = handler(
            ComponentType::Register,
            Controller::Registration(RegistrationController::new()),
        );
        let err = dispatcher().handle_get(get(register)).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_GET_COMPONENT");
    }

    #[tokio::test]
    async fn directory_getter_must_return_a_list() {
        let empty = handler(
            ComponentType::Directory,
            Controller::Directory(DirectoryController::new().getter(|_, _| async { Ok(None) })),
        );
        let err = dispatcher().handle_get(get(empty)).await.unwrap_err();
        assert_eq!(err.code(), "DIRECTORY_NO_BROWSERESULT_RETURNED_FROM_GETTER");

        let library = handler(
            ComponentType::Directory,
            Controller::Directory(DirectoryController::new().getter(|_, params| async move {
                let list = ListBuilder::new(ListParams::from_browse("Library", &params))?
                    .add_list_item(ListItem::new("Song"));
                Ok::<_, anyhow::Error>(Some(list))
            })),
        );
        let request = GetRequest {
            handler: library,
            device_id: "d1".into(),
            browse: Some(BrowseParams {
                limit: Some(10),
                ..BrowseParams::default()
            }),
        };
        let value = dispatcher().handle_get(request).await.unwrap();
        assert_eq!(value["title"], "Library");
        assert_eq!(value["_meta"]["current"]["limit"], 10);
    }

    #[tokio::test]
    async fn registration_flow() {
        let registration = handler(
            ComponentType::Register,
            Controller::Registration(
                RegistrationController::new()
                    .is_registered(|| async { Ok(false) })
                    .register(|credentials| async move { Ok(json!({ "echo": credentials })) }),
            ),
        );
        let d = dispatcher();
        assert_eq!(
            d.is_registered(registration.clone()).await.unwrap(),
            json!({ "registered": false })
        );
        assert_eq!(
            d.register(registration, json!({ "code": "1234" })).await.unwrap(),
            json!({ "echo": { "code": "1234" } })
        );
    }

    #[tokio::test]
    async fn discover_normalizes_results() {
        let discover = handler(
            ComponentType::Discover,
            Controller::Discovery(crate::device::controller::discover_fn(|_| async {
                Ok(DiscoveryResult::Many(vec![
                    DiscoveredDevice::new("a", "Lamp A").reachable(true),
                ]))
            })),
        );
        let entries = dispatcher()
            .discover(DiscoverRequest {
                handler: discover,
                adapter_name: "apt-x".into(),
                device_id: None,
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reachable, Some(true));
    }

    #[tokio::test]
    async fn controller_failures_propagate() {
        let broken = handler(
            ComponentType::Sensor,
            Controller::Accessor(AccessorController::with_getter(|_| async {
                Err(anyhow::anyhow!("device offline"))
            })),
        );
        let err = dispatcher().handle_get(get(broken)).await.unwrap_err();
        assert_eq!(err.code(), "CONTROLLER_FAILED");
        assert!(err.to_string().contains("device offline"));
    }
}
