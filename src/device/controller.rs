//! Controller callbacks supplied by device adapters
//!
//! A controller is the user-supplied half of a capability. Its shape depends
//! on the component type: a plain function for buttons and labels, a
//! getter/setter pair for sensors, sliders and switches, a getter/action pair
//! for directories, and dedicated shapes for discovery, registration and
//! device subscriptions.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::dispatch::DiscoveryResult;
use crate::list::{BrowseParams, ListBuilder};
use crate::notification::NotificationHandle;

/// Future returned by every controller callback
pub type ControllerFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// `(deviceId) -> value`
pub type ValueFn = Arc<dyn Fn(String) -> ControllerFuture<Value> + Send + Sync>;

/// `(deviceId, value) -> ()`
pub type SetterFn = Arc<dyn Fn(String, Value) -> ControllerFuture<()> + Send + Sync>;

/// `(buttonName, deviceId) -> ()`
pub type ButtonFn = Arc<dyn Fn(String, String) -> ControllerFuture<()> + Send + Sync>;

/// `(deviceId, params) -> browse result`
pub type BrowseFn =
    Arc<dyn Fn(String, BrowseParams) -> ControllerFuture<Option<ListBuilder>> + Send + Sync>;

/// `(deviceId, actionBody) -> ()`
pub type ActionFn = Arc<dyn Fn(String, Value) -> ControllerFuture<()> + Send + Sync>;

/// `(optionalDeviceId) -> discovered devices`
pub type DiscoverFn = Arc<dyn Fn(Option<String>) -> ControllerFuture<DiscoveryResult> + Send + Sync>;

/// `(credentials) -> raw result`
pub type RegisterFn = Arc<dyn Fn(Value) -> ControllerFuture<Value> + Send + Sync>;

/// `() -> registered?`
pub type IsRegisteredFn = Arc<dyn Fn() -> ControllerFuture<bool> + Send + Sync>;

/// `(deviceId) -> ()`
pub type DeviceIdFn = Arc<dyn Fn(String) -> ControllerFuture<()> + Send + Sync>;

/// `(deviceIds) -> ()`
pub type DeviceListFn = Arc<dyn Fn(Vec<String>) -> ControllerFuture<()> + Send + Sync>;

/// Receives the notification handle once a session is running
pub type SubscriptionFn = Arc<dyn Fn(NotificationHandle) + Send + Sync>;

/// Wrap an async closure as a [`ValueFn`]
pub fn value_fn<F, Fut>(f: F) -> ValueFn
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |device_id| f(device_id).boxed())
}

/// Wrap an async closure as a [`SetterFn`]
pub fn setter_fn<F, Fut>(f: F) -> SetterFn
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |device_id, value| f(device_id, value).boxed())
}

/// Wrap an async closure as a [`ButtonFn`]
pub fn button_fn<F, Fut>(f: F) -> ButtonFn
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |name, device_id| f(name, device_id).boxed())
}

/// Wrap an async closure as a [`BrowseFn`]
pub fn browse_fn<F, Fut>(f: F) -> BrowseFn
where
    F: Fn(String, BrowseParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<ListBuilder>>> + Send + 'static,
{
    Arc::new(move |device_id, params| f(device_id, params).boxed())
}

/// Wrap an async closure as an [`ActionFn`]
pub fn action_fn<F, Fut>(f: F) -> ActionFn
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |device_id, body| f(device_id, body).boxed())
}

/// Wrap an async closure as a [`DiscoverFn`]
pub fn discover_fn<F, Fut>(f: F) -> DiscoverFn
where
    F: Fn(Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<DiscoveryResult>> + Send + 'static,
{
    Arc::new(move |device_id| f(device_id).boxed())
}

/// Wrap an async closure as a [`RegisterFn`]
pub fn register_fn<F, Fut>(f: F) -> RegisterFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |credentials| f(credentials).boxed())
}

/// Wrap an async closure as an [`IsRegisteredFn`]
pub fn is_registered_fn<F, Fut>(f: F) -> IsRegisteredFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Wrap an async closure as a [`DeviceIdFn`]
pub fn device_id_fn<F, Fut>(f: F) -> DeviceIdFn
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |device_id| f(device_id).boxed())
}

/// Wrap an async closure as a [`DeviceListFn`]
pub fn device_list_fn<F, Fut>(f: F) -> DeviceListFn
where
    F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |device_ids| f(device_ids).boxed())
}

/// Getter with optional setter: sensors, sliders and switches
#[derive(Clone, Default)]
pub struct AccessorController {
    pub getter: Option<ValueFn>,
    pub setter: Option<SetterFn>,
}

impl AccessorController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Getter-only controller
    pub fn with_getter<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::new().getter(f)
    }

    #[must_use]
    pub fn getter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.getter = Some(value_fn(f));
        self
    }

    #[must_use]
    pub fn setter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.setter = Some(setter_fn(f));
        self
    }
}

/// Browse getter paired with an action for directories
#[derive(Clone, Default)]
pub struct DirectoryController {
    pub getter: Option<BrowseFn>,
    pub action: Option<ActionFn>,
}

impl DirectoryController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn getter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, BrowseParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<ListBuilder>>> + Send + 'static,
    {
        self.getter = Some(browse_fn(f));
        self
    }

    #[must_use]
    pub fn action<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.action = Some(action_fn(f));
        self
    }
}

/// Registration callbacks
#[derive(Clone, Default)]
pub struct RegistrationController {
    pub register: Option<RegisterFn>,
    pub is_registered: Option<IsRegisteredFn>,
}

impl RegistrationController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.register = Some(register_fn(f));
        self
    }

    #[must_use]
    pub fn is_registered<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.is_registered = Some(is_registered_fn(f));
        self
    }
}

/// Device subscription lifecycle callbacks
#[derive(Clone, Default)]
pub struct SubscriptionController {
    pub device_added: Option<DeviceIdFn>,
    pub device_removed: Option<DeviceIdFn>,
    pub initialize_device_list: Option<DeviceListFn>,
}

impl SubscriptionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn device_added<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.device_added = Some(device_id_fn(f));
        self
    }

    #[must_use]
    pub fn device_removed<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.device_removed = Some(device_id_fn(f));
        self
    }

    #[must_use]
    pub fn initialize_device_list<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.initialize_device_list = Some(device_list_fn(f));
        self
    }
}

/// Controller shapes, one variant per callback layout
#[derive(Clone)]
pub enum Controller {
    /// `(deviceId) -> value` for buttons, text labels and image URLs
    Function(ValueFn),
    /// Getter/setter for sensors, sliders and switches
    Accessor(AccessorController),
    /// Getter/action for directories
    Directory(DirectoryController),
    /// Device discovery
    Discovery(DiscoverFn),
    /// Device registration
    Registration(RegistrationController),
    /// Device subscription lifecycle
    Subscription(SubscriptionController),
}

impl Controller {
    /// Shape name used in logs and errors
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Accessor(_) => "accessor",
            Self::Directory(_) => "directory",
            Self::Discovery(_) => "discovery",
            Self::Registration(_) => "registration",
            Self::Subscription(_) => "subscription",
        }
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Controller").field(&self.shape()).finish()
    }
}

impl fmt::Debug for AccessorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorController")
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

impl fmt::Debug for DirectoryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryController")
            .field("getter", &self.getter.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl fmt::Debug for RegistrationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationController")
            .field("register", &self.register.is_some())
            .field("is_registered", &self.is_registered.is_some())
            .finish()
    }
}

impl fmt::Debug for SubscriptionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionController")
            .field("device_added", &self.device_added.is_some())
            .field("device_removed", &self.device_removed.is_some())
            .field("initialize_device_list", &self.initialize_device_list.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accessor_builder_wraps_closures() {
        let controller = AccessorController::new()
            .getter(|device_id| async move { Ok(Value::String(device_id)) })
            .setter(|_, _| async { Ok(()) });

        let getter = controller.getter.clone().unwrap();
        assert_eq!(getter("d1".to_string()).await.unwrap(), "d1");
        assert!(controller.setter.is_some());
    }

    #[test]
    fn debug_shows_shape_only() {
        let controller = Controller::Accessor(AccessorController::new());
        assert_eq!(format!("{controller:?}"), "Controller(\"accessor\")");
    }
}
