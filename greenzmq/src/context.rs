//! Socket factory.

use std::rc::Rc;

use greenzmq_core::Hub;
use tracing::debug;

use crate::error::Result;
use crate::options::AdapterOptions;
use crate::raw::ZmqSocket;
use crate::runtime::CompioHub;
use crate::socket::GreenSocket;
use crate::socket_kind::SocketKind;

/// libzmq context that hands out [`GreenSocket`]s.
///
/// Every socket it creates shares the context's hub and adapter options.
///
/// # Examples
///
/// ```rust,no_run
/// use greenzmq::{Context, Flags, SocketKind};
///
/// # async fn example() -> greenzmq::Result<()> {
/// let ctx = Context::new();
/// let push = ctx.socket(SocketKind::Push)?;
/// push.with_raw(|raw| raw.as_zmq().connect("tcp://127.0.0.1:5555"))??;
/// push.send("hello", Flags::NONE).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Context {
    inner: zmq::Context,
    hub: Rc<dyn Hub>,
    options: AdapterOptions,
}

impl Context {
    /// Fresh libzmq context driven by the compio runtime.
    pub fn new() -> Self {
        Self::with_hub(Rc::new(CompioHub::new()))
    }

    /// Fresh libzmq context with a custom scheduler.
    pub fn with_hub(hub: Rc<dyn Hub>) -> Self {
        Self {
            inner: zmq::Context::new(),
            hub,
            options: AdapterOptions::default(),
        }
    }

    /// Share an existing libzmq context.
    pub fn from_zmq(inner: zmq::Context, hub: Rc<dyn Hub>) -> Self {
        Self {
            inner,
            hub,
            options: AdapterOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn socket(&self, kind: SocketKind) -> Result<GreenSocket> {
        debug!(%kind, "creating socket");
        let raw = ZmqSocket::new(&self.inner, kind)?;
        Ok(GreenSocket::with_options(
            raw,
            self.hub.clone(),
            self.options.clone(),
        ))
    }

    pub fn get_ref(&self) -> &zmq::Context {
        &self.inner
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
