//! Registration macros that infer dependencies from closure parameters.
//!
//! The parameter list is captured as text with `stringify!` and handed to the
//! signature parser when the registration is first resolved, so the parameter
//! names are the dependency tokens. Each parameter is bound to the typed
//! value of its slot (`Arc<T>`).

/// Registers a factory whose dependencies are its closure's parameter names.
///
/// # Examples
///
/// ```
/// use fibre_di::{factory, Registry};
///
/// let registry = Registry::new();
/// registry.constant("a", 1_i32).unwrap();
/// factory!(registry, "b", |a: i32| *a + 1).unwrap();
/// factory!(registry, "c", |b: i32| *b + 1).unwrap();
///
/// let c = registry.resolve_as::<i32>("c").unwrap();
/// assert_eq!(*c, 3);
/// ```
#[macro_export]
macro_rules! factory {
  ($registry:expr, $token:expr, |$($param:ident : $ty:ty),* $(,)?| $body:expr) => {
    $registry.factory(
      $token,
      $crate::Declaration::signature(stringify!(|$($param : $ty),*|)),
      move |args: &$crate::Args| {
        #[allow(unused_mut, unused_variables)]
        let mut cursor = args.cursor();
        $( let $param: ::std::sync::Arc<$ty> = cursor.take::<$ty>()?; )*
        ::std::result::Result::Ok($body)
      },
    )
  };
  ($registry:expr, $token:expr, || $body:expr) => {
    $crate::factory!($registry, $token, | | $body)
  };
}

/// Registers a service whose dependencies are its closure's parameter names.
///
/// The closure also receives the full [`Args`](crate::Args) through the
/// `args` binding given before the parameter list, which exposes the named
/// parameters and a chained parent instance.
///
/// # Examples
///
/// ```
/// use fibre_di::{service, Registry};
///
/// struct Master {
///   sub: String,
/// }
///
/// let registry = Registry::new();
/// registry.constant("dependent", String::from("DEPENDENT")).unwrap();
/// service!(registry, "master", args => |dependent: String| {
///   assert!(args.named().contains("dependent"));
///   Master { sub: (*dependent).clone() }
/// })
/// .unwrap();
///
/// let master = registry.resolve_as::<Master>("master").unwrap();
/// assert_eq!(master.sub, "DEPENDENT");
/// ```
#[macro_export]
macro_rules! service {
  ($registry:expr, $token:expr, $args:ident => |$($param:ident : $ty:ty),* $(,)?| $body:expr) => {
    $registry.service(
      $token,
      $crate::Declaration::signature(stringify!(|$($param : $ty),*|)),
      move |$args: &$crate::Args| {
        #[allow(unused_mut, unused_variables)]
        let mut cursor = $args.cursor();
        $( let $param: ::std::sync::Arc<$ty> = cursor.take::<$ty>()?; )*
        ::std::result::Result::Ok($body)
      },
    )
  };
  ($registry:expr, $token:expr, $args:ident => || $body:expr) => {
    $crate::service!($registry, $token, $args => | | $body)
  };
  ($registry:expr, $token:expr, |$($param:ident : $ty:ty),* $(,)?| $body:expr) => {
    $crate::service!($registry, $token, _args => |$($param : $ty),*| $body)
  };
  ($registry:expr, $token:expr, || $body:expr) => {
    $crate::service!($registry, $token, _args => | | $body)
  };
}
