//! Declarative generation of profiled interfaces
//!
//! [`profiled_interface!`](crate::profiled_interface) declares a trait, its
//! operation table, and an adapter making `Proxy<T, dyn Trait>` implement the
//! trait for every `T: Trait`. Each operation is prefixed with its timing
//! marker: `profiled` or `passthrough`.

/// Declare a trait whose operations can be timed through a [`Proxy`](crate::Proxy)
///
/// Operations must take `&self` and may not be generic. Interfaces with
/// `&mut self` operations implement [`Interface`](crate::Interface) and the
/// adapter by hand on top of [`Proxy::invoke_mut`](crate::Proxy::invoke_mut).
///
/// Return types may not borrow from `self`: the proxy hands the target to a
/// closure, and a closure's result cannot outlive that borrow. Return an
/// owned value or a `'static` reference instead.
///
/// ```compile_fail
/// calltime::profiled_interface! {
///     pub trait Named {
///         passthrough fn name(&self) -> &str;
///     }
/// }
/// ```
///
/// Records are keyed by the runtime type of the target. The macro also
/// implements the trait for `Box<T>` and `Arc<T>`, so a `Box<dyn Trait>`
/// picked at runtime can be wrapped directly and still records under the
/// concrete type inside the box.
///
/// # Example
///
/// ```
/// use calltime::clock::SystemClock;
/// use calltime::{profiled_interface, Profiler};
/// use std::sync::Arc;
///
/// profiled_interface! {
///     /// Crawls pages starting from a set of URLs
///     pub trait WebCrawler {
///         /// Crawl `url` and return the number of pages visited
///         profiled fn crawl(&self, url: &str) -> usize;
///         passthrough fn max_parallelism(&self) -> usize;
///     }
/// }
///
/// struct SequentialCrawler;
///
/// impl WebCrawler for SequentialCrawler {
///     fn crawl(&self, _url: &str) -> usize {
///         1
///     }
///
///     fn max_parallelism(&self) -> usize {
///         1
///     }
/// }
///
/// let profiler = Profiler::new(Arc::new(SystemClock));
/// let crawler = profiler.wrap::<dyn WebCrawler, _>(SequentialCrawler).unwrap();
///
/// assert_eq!(crawler.crawl("https://example.com"), 1);
/// assert_eq!(crawler.max_parallelism(), 1);
/// assert_eq!(profiler.state().export().len(), 1);
/// ```
#[macro_export]
macro_rules! profiled_interface {
    (
        $(#[$trait_meta:meta])*
        $vis:vis trait $iface:ident {
            $(
                $(#[$op_meta:meta])*
                $marker:ident fn $op:ident(&self $(, $arg:ident : $arg_ty:ty)*) $(-> $ret:ty)?;
            )*
        }
    ) => {
        $(#[$trait_meta])*
        $vis trait $iface {
            $(
                $(#[$op_meta])*
                fn $op(&self $(, $arg: $arg_ty)*) $(-> $ret)?;
            )*

            #[doc(hidden)]
            fn __target_type_name(&self) -> &'static str {
                ::std::any::type_name::<Self>()
            }
        }

        impl $crate::Interface for dyn $iface {
            const NAME: &'static str = stringify!($iface);

            fn operations() -> &'static [$crate::Operation] {
                const OPERATIONS: &[$crate::Operation] = &[
                    $(
                        $crate::Operation::new(
                            stringify!($op),
                            stringify!(fn $op(&self $(, $arg: $arg_ty)*) $(-> $ret)?),
                            $crate::__timing_marker!($marker),
                        ),
                    )*
                ];
                OPERATIONS
            }
        }

        impl<T: $iface> $iface for $crate::Proxy<T, dyn $iface> {
            $(
                fn $op(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    let target_type = $iface::__target_type_name(self.target());
                    self.invoke_as(target_type, stringify!($op), |target| target.$op($($arg),*))
                }
            )*

            fn __target_type_name(&self) -> &'static str {
                $iface::__target_type_name(self.target())
            }
        }

        impl<T: $iface + ?Sized> $iface for ::std::boxed::Box<T> {
            $(
                fn $op(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    $iface::$op(&**self $(, $arg)*)
                }
            )*

            fn __target_type_name(&self) -> &'static str {
                $iface::__target_type_name(&**self)
            }
        }

        impl<T: $iface + ?Sized> $iface for ::std::sync::Arc<T> {
            $(
                fn $op(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
                    $iface::$op(&**self $(, $arg)*)
                }
            )*

            fn __target_type_name(&self) -> &'static str {
                $iface::__target_type_name(&**self)
            }
        }
    };
}

/// Map an operation marker keyword to its boolean value
#[doc(hidden)]
#[macro_export]
macro_rules! __timing_marker {
    (profiled) => {
        true
    };
    (passthrough) => {
        false
    };
}
