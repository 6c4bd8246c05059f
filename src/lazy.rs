use super::{error::Result, response::DeferredResponse};

use derivative::Derivative;

use once_cell::sync::OnceCell;

use tracing::debug;

/// Builds a model out of a response.
pub type Constructor<T> = Box<dyn Fn(&DeferredResponse) -> Result<T> + Send + Sync>;

/// A model that is only built when it's first needed.
///
/// The model is constructed by the first call to [`materialize`](Self::materialize), which
/// waits for the response and parses it. The model is then kept and handed out by every later
/// call. If construction fails, the error is returned and the next call tries again.
///
/// Models expose a `LazyModel` through a wrapper implementing their capability trait (see
/// [`LazyStatus`](crate::status::LazyStatus)), so that a lazy handle can be used wherever the
/// model can. **Any method call on such a handle may block** while the response is fetched,
/// and the first one to do so is the one reporting construction failures.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LazyModel<T> {
    response: DeferredResponse,
    #[derivative(Debug = "ignore")]
    construct: Constructor<T>,
    model: OnceCell<T>,
}

impl<T> LazyModel<T> {
    pub fn new<F>(response: DeferredResponse, construct: F) -> Self
    where
        F: Fn(&DeferredResponse) -> Result<T> + Send + Sync + 'static,
    {
        LazyModel {
            response,
            construct: Box::new(construct),
            model: OnceCell::new(),
        }
    }

    /// Returns the model, building it first if needed.
    pub fn materialize(&self) -> Result<&T> {
        self.model.get_or_try_init(|| {
            debug!(model = std::any::type_name::<T>(), "initializing lazy model");
            (self.construct)(&self.response)
        })
    }

    /// Whether the model has been built already.
    pub fn is_materialized(&self) -> bool {
        self.model.get().is_some()
    }

    /// Consumes the handle, returning the model. Builds it if needed.
    pub fn into_inner(self) -> Result<T> {
        match self.model.into_inner() {
            Some(model) => Ok(model),
            None => (self.construct)(&self.response),
        }
    }

    /// The response the model is built from.
    pub fn response(&self) -> &DeferredResponse {
        &self.response
    }
}

/// Declares a lazy wrapper around a model, implementing the model's capability trait by
/// materializing the model and forwarding every call to it.
///
/// Also implements the capability trait for `Either<L, R>` of two implementors, so that eager
/// and lazy models can be handed out as one type.
macro_rules! lazy_model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($model:ty): $capability:ident {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident: $arg_ty:ty)*) -> $ret:ty;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name($crate::lazy::LazyModel<$model>);

        impl $name {
            /// Wraps `response`; `construct` builds the model from it on first use.
            pub fn new<F>(response: $crate::response::DeferredResponse, construct: F) -> Self
            where
                F: Fn(&$crate::response::DeferredResponse) -> $crate::error::Result<$model>
                    + Send
                    + Sync
                    + 'static,
            {
                $name($crate::lazy::LazyModel::new(response, construct))
            }

            /// Whether the model has been built already.
            pub fn is_materialized(&self) -> bool {
                self.0.is_materialized()
            }

            /// Consumes the handle, returning the model.
            pub fn into_inner(self) -> $crate::error::Result<$model> {
                self.0.into_inner()
            }

            /// The response the model is built from.
            pub fn response(&self) -> &$crate::response::DeferredResponse {
                self.0.response()
            }
        }

        impl $capability for $name {
            $(
                $(#[$method_meta])*
                fn $method(&self $(, $arg: $arg_ty)*) -> $crate::error::Result<$ret> {
                    ::tracing::trace!(method = stringify!($method), "forwarding to lazy model");
                    $capability::$method(self.0.materialize()?, $($arg),*)
                }
            )*
        }

        impl<L: $capability, R: $capability> $capability for ::either::Either<L, R> {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) -> $crate::error::Result<$ret> {
                    match self {
                        ::either::Either::Left(inner) => $capability::$method(inner, $($arg),*),
                        ::either::Either::Right(inner) => $capability::$method(inner, $($arg),*),
                    }
                }
            )*
        }
    };
}

pub(crate) use lazy_model;
