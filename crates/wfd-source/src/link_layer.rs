//! The link-layer collaborator interface (spec §1 "Out of scope": Wi-Fi
//! P2P discovery/association, DHCP, firmware loading, interface
//! selection). The core only consumes these three narrow events; the
//! actual P2P stack is an external process not modeled here.

use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    GroupOwner,
    GroupClient,
}

/// Events the link layer delivers to the Connection Manager.
#[derive(Debug, Clone)]
pub enum LinkLayerEvent {
    PeerConnected {
        role: PeerRole,
        local_ip: IpAddr,
        remote_ip: IpAddr,
    },
    PeerDisconnected,
    AddressAssigned {
        local_ip: IpAddr,
    },
}
