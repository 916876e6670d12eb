use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, UdpSocket},
};

use crate::{
    EnvSource, Error, Result, SystemEnv,
    provider::{MAX_MACHINE_ID, MachineIdProvider},
};

const IPS_KEY: &str = "ips";

/// Resolves the machine id as the position of the local IP in an ordered,
/// comma-separated list shared by the whole fleet.
///
/// Accepts `ips=10.0.0.1,10.0.0.2` or the bare list. The list is validated on
/// [`MachineIdProvider::init`], but the local IP is only looked up when an id
/// is requested, so a `MACHINE_ID` override still resolves on hosts missing
/// from the list.
#[derive(Debug, Clone)]
pub struct IpConfigurableMachineIdProvider<E = SystemEnv> {
    ips: Vec<String>,
    ids: HashMap<String, u64>,
    local_ip: Option<IpAddr>,
    env: E,
}

impl IpConfigurableMachineIdProvider {
    pub fn new() -> Self {
        Self::with_env(SystemEnv)
    }
}

impl Default for IpConfigurableMachineIdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnvSource> IpConfigurableMachineIdProvider<E> {
    pub fn with_env(env: E) -> Self {
        Self {
            ips: Vec::new(),
            ids: HashMap::new(),
            local_ip: None,
            env,
        }
    }

    /// Pins the address used as "the local IP" instead of probing the host.
    pub fn with_local_ip(mut self, ip: IpAddr) -> Self {
        self.local_ip = Some(ip);
        self
    }

    /// The configured list, in machine id order.
    pub fn ips(&self) -> &[String] {
        &self.ips
    }

    fn local_ip(&self) -> Result<IpAddr> {
        match self.local_ip {
            Some(ip) => Ok(ip),
            None => detect_local_ip(),
        }
    }
}

impl<E: EnvSource> MachineIdProvider for IpConfigurableMachineIdProvider<E> {
    fn init(&mut self, init_params: &str) -> Result<()> {
        let illegal = || Error::InvalidInitParams {
            provider: "IpConfigurableMachineIdProvider",
            params: init_params.to_owned(),
        };

        let list = match init_params.split_once('=') {
            Some((key, list)) if key.trim() == IPS_KEY && !list.contains('=') => list,
            Some(_) => return Err(illegal()),
            None => init_params,
        };

        let ips: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_owned)
            .collect();
        if ips.is_empty() || ips.len() as u64 > MAX_MACHINE_ID + 1 {
            return Err(illegal());
        }

        let mut ids = HashMap::with_capacity(ips.len());
        for (position, ip) in ips.iter().enumerate() {
            if ids.insert(ip.clone(), position as u64).is_some() {
                // The same IP at two positions would map one host to two ids.
                return Err(illegal());
            }
        }

        self.ips = ips;
        self.ids = ids;
        Ok(())
    }

    fn machine_id(&self) -> Result<u64> {
        if self.ips.is_empty() {
            return Err(Error::Uninitialized {
                provider: "IpConfigurableMachineIdProvider",
            });
        }
        let ip = self.local_ip()?.to_string();
        self.ids
            .get(&ip)
            .copied()
            .ok_or_else(|| Error::UnknownHostIp {
                ip,
                configured: self.ips.clone(),
            })
    }

    fn env(&self) -> &dyn EnvSource {
        &self.env
    }
}

/// Finds the address of the interface that routes outbound traffic.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
fn detect_local_ip() -> Result<IpAddr> {
    let unavailable = |e: std::io::Error| Error::LocalIpUnavailable {
        reason: e.to_string(),
    };
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(unavailable)?;
    socket
        .connect((Ipv4Addr::new(10, 255, 255, 255), 1))
        .map_err(unavailable)?;
    let ip = socket.local_addr().map_err(unavailable)?.ip();
    if ip.is_unspecified() {
        return Err(Error::LocalIpUnavailable {
            reason: "no routable interface".to_owned(),
        });
    }
    Ok(ip)
}
