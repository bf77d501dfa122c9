// Scripts and config templates mounted into the ironic and dhcp pods.
// The copies under files/ are compiled in; a directory or map can stand in for them.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use tracing::debug;

pub const DB_INIT: &str = "db_init.py";
pub const DB_SYNC: &str = "db_sync.sh";
pub const IRONIC_STANDALONE: &str = "ironic_standalone.sh";
pub const IRONIC_CONDUCTOR_INIT: &str = "ironic_conductor_init.sh";
pub const IRONIC_CONDUCTOR_PXE: &str = "ironic_conductor_pxe.sh";
pub const IRONIC_CONDUCTOR_PXE_INIT: &str = "ironic_conductor_pxe_init.sh";
pub const IRONIC_CONDUCTOR_HTTP: &str = "ironic_conductor_http.sh";
pub const IRONIC_CONF: &str = "ironic.conf";
pub const POLICY_JSON: &str = "policy.json";
pub const TFTP_MAP: &str = "tftp_map.txt";
pub const NGINX_CONF: &str = "nginx.conf";
pub const DHCP_SERVER_INIT: &str = "dhcp_server_init.sh";
pub const DHCP_SERVER: &str = "dhcp_server.sh";
pub const DHCP_CONF: &str = "dhcp.conf";

pub const EMBEDDED: &[(&str, &str)] = &[
    (DB_INIT, include_str!("../files/db_init.py")),
    (DB_SYNC, include_str!("../files/db_sync.sh")),
    (IRONIC_STANDALONE, include_str!("../files/ironic_standalone.sh")),
    (IRONIC_CONDUCTOR_INIT, include_str!("../files/ironic_conductor_init.sh")),
    (IRONIC_CONDUCTOR_PXE, include_str!("../files/ironic_conductor_pxe.sh")),
    (IRONIC_CONDUCTOR_PXE_INIT, include_str!("../files/ironic_conductor_pxe_init.sh")),
    (IRONIC_CONDUCTOR_HTTP, include_str!("../files/ironic_conductor_http.sh")),
    (IRONIC_CONF, include_str!("../files/ironic.conf")),
    (POLICY_JSON, include_str!("../files/policy.json")),
    (TFTP_MAP, include_str!("../files/tftp_map.txt")),
    (NGINX_CONF, include_str!("../files/nginx.conf")),
    (DHCP_SERVER_INIT, include_str!("../files/dhcp_server_init.sh")),
    (DHCP_SERVER, include_str!("../files/dhcp_server.sh")),
    (DHCP_CONF, include_str!("../files/dhcp.conf")),
];

#[derive(Clone, Debug, Default)]
pub enum Payloads {
    #[default]
    Embedded,
    Directory(PathBuf),
    Map(BTreeMap<String, String>),
}

impl Payloads {
    pub fn load(&self, file: &str) -> Result<String> {
        debug!("loading payload {}", file);
        let found = match self {
            Payloads::Embedded => EMBEDDED
                .iter()
                .find(|(name, _)| *name == file)
                .map(|(_, content)| content.to_string()),
            Payloads::Directory(dir) => {
                return std::fs::read_to_string(dir.join(file)).map_err(|source| {
                    Error::ResourceLoadError {
                        file: file.to_string(),
                        source,
                    }
                });
            }
            Payloads::Map(files) => files.get(file).cloned(),
        };
        found.ok_or_else(|| Error::ResourceLoadError {
            file: file.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not bundled"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_file_is_embedded() {
        for file in [
            DB_INIT,
            DB_SYNC,
            IRONIC_STANDALONE,
            IRONIC_CONDUCTOR_INIT,
            IRONIC_CONDUCTOR_PXE,
            IRONIC_CONDUCTOR_PXE_INIT,
            IRONIC_CONDUCTOR_HTTP,
            IRONIC_CONF,
            POLICY_JSON,
            TFTP_MAP,
            NGINX_CONF,
            DHCP_SERVER_INIT,
            DHCP_SERVER,
            DHCP_CONF,
        ] {
            let content = Payloads::Embedded.load(file).unwrap();
            assert!(!content.is_empty(), "{} is empty", file);
        }
        assert_eq!(EMBEDDED.len(), 14);
    }

    #[test]
    fn ironic_conf_carries_connection_placeholder() {
        let conf = Payloads::Embedded.load(IRONIC_CONF).unwrap();
        assert!(conf.contains("##MYSQL_CONNECTION##"));
    }

    #[test]
    fn unknown_file_is_a_load_error() {
        match Payloads::Embedded.load("missing.sh") {
            Err(Error::ResourceLoadError { file, source }) => {
                assert_eq!(file, "missing.sh");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn directory_reads_from_disk() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("files");
        let payloads = Payloads::Directory(dir);
        assert_eq!(
            payloads.load(DHCP_CONF).unwrap(),
            Payloads::Embedded.load(DHCP_CONF).unwrap()
        );
        assert!(matches!(
            payloads.load("nope.conf"),
            Err(Error::ResourceLoadError { .. })
        ));
    }

    #[test]
    fn map_only_serves_its_entries() {
        let payloads = Payloads::Map(BTreeMap::from([(
            DHCP_CONF.to_string(),
            "option domain-name \"x\";".to_string(),
        )]));
        assert_eq!(payloads.load(DHCP_CONF).unwrap(), "option domain-name \"x\";");
        assert!(payloads.load(DHCP_SERVER).is_err());
    }
}
