//! Flutter SDK discovery and command construction for `flutterkit`.
//!
//! The entry point is [`sdk::FlutterSdk`]: an immutable handle to an
//! installed SDK, obtained from a raw path, from a project's Dart toolchain
//! path (memoized through [`registry::SdkRegistry`]), or from a Bazel
//! workspace descriptor. The handle builds [`flutterkit_command::CommandSpec`]
//! values for the fixed set of `flutter` operations and offers the bounded
//! machine-mode config query.

pub mod bazel;
pub mod config_query;
pub mod registry;
pub mod sdk;
pub mod version;

pub use self::{
    bazel::{BackendOverride, DartToolchainResolver, FixedDartToolchain, Workspace},
    registry::SdkRegistry,
    sdk::FlutterSdk,
    version::FlutterSdkVersion,
};
