mod endpoint;

pub use endpoint::{endpoint_key, LocalEndpoint};

cfg_if! {
    if #[cfg(feature = "local_discovery")] {
        mod listings;
        mod responder;

        pub use listings::{
            interface_probes, refresh_local_udp_listings, refresh_udp_listings, DiscoveryProbe,
        };
        pub use responder::DiscoveryResponder;
    }
}
