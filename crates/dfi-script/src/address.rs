//! Address/Script codec.
//!
//! Converts between address strings and locking scripts for the three
//! DeFiChain networks. Legacy addresses (P2PKH, P2SH) are Base58Check with
//! a network version byte; segwit addresses are bech32 with a network HRP.
//! All functions here are pure.

use std::fmt;
use std::str::FromStr;

use bech32::{segwit, Fe32, Hrp};
use serde::{Deserialize, Serialize};

use dfi_primitives::base58;
use dfi_primitives::ec::PublicKey;
use dfi_primitives::hash::hash160;

use crate::script::Script;
use crate::ScriptError;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// A DeFiChain network and its address parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Mainnet, Network::Testnet, Network::Regtest];

    /// Base58 version byte for P2PKH addresses.
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x12,
            Network::Testnet => 0x0f,
            Network::Regtest => 0x6f,
        }
    }

    /// Base58 version byte for P2SH addresses.
    pub fn p2sh_version(self) -> u8 {
        match self {
            Network::Mainnet => 0x5a,
            Network::Testnet => 0x80,
            Network::Regtest => 0xc4,
        }
    }

    /// Human-readable part of bech32 addresses.
    pub fn bech32_hrp(self) -> &'static str {
        match self {
            Network::Mainnet => "df",
            Network::Testnet => "tf",
            Network::Regtest => "bcrt",
        }
    }

    /// WIF private key prefix.
    pub fn wif_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet | Network::Regtest => 0xef,
        }
    }

    fn from_base58_version(version: u8) -> Option<(Network, LegacyKind)> {
        Network::ALL.into_iter().find_map(|n| {
            if version == n.p2pkh_version() {
                Some((n, LegacyKind::PubkeyHash))
            } else if version == n.p2sh_version() {
                Some((n, LegacyKind::ScriptHash))
            } else {
                None
            }
        })
    }

    fn from_hrp(hrp: &str) -> Option<Network> {
        Network::ALL.into_iter().find(|n| n.bech32_hrp() == hrp)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(ScriptError::InvalidScript(format!("unknown network '{}'", other))),
        }
    }
}

#[derive(Clone, Copy)]
enum LegacyKind {
    PubkeyHash,
    ScriptHash,
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// The decoded content of an address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AddressPayload {
    /// Legacy P2PKH: hash160 of a public key.
    PubkeyHash([u8; 20]),
    /// P2SH: hash160 of a redeem script.
    ScriptHash([u8; 20]),
    /// Segwit witness program.
    Segwit { version: u8, program: Vec<u8> },
}

/// Address flavours derivable from a single public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressKind {
    /// Legacy P2PKH.
    Legacy,
    /// P2WPKH wrapped in P2SH.
    P2shSegwit,
    /// Native bech32 P2WPKH.
    Bech32,
}

/// A network-scoped address.
///
/// The canonical string form is computed once at construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    address_string: String,
    payload: AddressPayload,
    network: Network,
}

impl Address {
    /// Parse an address string and detect its network.
    ///
    /// Bech32 strings are recognized by a known HRP; everything else is
    /// decoded as Base58Check and classified by version byte.
    pub fn from_string(addr: &str) -> Result<Self, ScriptError> {
        match split_hrp(addr) {
            // A Base58 string can start with an HRP look-alike, so fall back.
            Some(network) => Self::decode_segwit(addr, network)
                .or_else(|segwit_err| Self::decode_base58(addr).map_err(|_| segwit_err)),
            None => Self::decode_base58(addr),
        }
    }

    /// Parse an address string that must belong to `network`.
    pub fn parse(addr: &str, network: Network) -> Result<Self, ScriptError> {
        let address = Self::from_string(addr)?;
        if address.network != network {
            return Err(ScriptError::invalid_address(
                addr,
                format!("address is for {}, expected {}", address.network, network),
            ));
        }
        Ok(address)
    }

    /// Build an address from its payload, encoding the canonical string.
    pub fn new(payload: AddressPayload, network: Network) -> Result<Self, ScriptError> {
        let address_string = match &payload {
            AddressPayload::PubkeyHash(h) => base58::check_encode(network.p2pkh_version(), h),
            AddressPayload::ScriptHash(h) => base58::check_encode(network.p2sh_version(), h),
            AddressPayload::Segwit { version, program } => {
                encode_segwit(network, *version, program)?
            }
        };
        Ok(Address { address_string, payload, network })
    }

    /// Legacy P2PKH address for a key hash.
    pub fn from_public_key_hash(hash: &[u8; 20], network: Network) -> Self {
        Address {
            address_string: base58::check_encode(network.p2pkh_version(), hash),
            payload: AddressPayload::PubkeyHash(*hash),
            network,
        }
    }

    /// Derive an address of the given kind from a public key.
    pub fn from_public_key(
        pub_key: &PublicKey,
        kind: AddressKind,
        network: Network,
    ) -> Result<Self, ScriptError> {
        let pkh = pub_key.hash160();
        match kind {
            AddressKind::Legacy => Ok(Self::from_public_key_hash(&pkh, network)),
            AddressKind::P2shSegwit => {
                let redeem = Script::witness_v0(&pkh)?;
                Self::new(AddressPayload::ScriptHash(hash160(redeem.to_bytes())), network)
            }
            AddressKind::Bech32 => Self::new(
                AddressPayload::Segwit { version: 0, program: pkh.to_vec() },
                network,
            ),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn payload(&self) -> &AddressPayload {
        &self.payload
    }

    pub fn as_str(&self) -> &str {
        &self.address_string
    }

    /// Locking script paying to this address.
    ///
    /// Fails with `UnsupportedAddressType` for witness versions other than 0
    /// and for v0 programs that are neither 20 nor 32 bytes.
    pub fn locking_script(&self) -> Result<Script, ScriptError> {
        match &self.payload {
            AddressPayload::PubkeyHash(h) => Ok(Script::p2pkh(h)),
            AddressPayload::ScriptHash(h) => Ok(Script::p2sh(h)),
            AddressPayload::Segwit { version: 0, program }
                if program.len() == 20 || program.len() == 32 =>
            {
                Script::witness_v0(program)
            }
            AddressPayload::Segwit { version, program } => {
                Err(ScriptError::UnsupportedAddressType(format!(
                    "witness version {} with {}-byte program",
                    version,
                    program.len()
                )))
            }
        }
    }

    /// Inverse of `locking_script` for P2PKH, P2SH, and segwit v0 scripts.
    pub fn from_script(script: &Script, network: Network) -> Result<Self, ScriptError> {
        let payload = match script.hash160_payload() {
            Some(h) if script.is_p2pkh() => AddressPayload::PubkeyHash(h),
            Some(h) if script.is_p2sh() => AddressPayload::ScriptHash(h),
            _ if script.is_p2wpkh() || script.is_p2wsh() => AddressPayload::Segwit {
                version: 0,
                program: script.to_bytes()[2..].to_vec(),
            },
            _ => return Err(ScriptError::UnrecognizedScript(script.to_hex())),
        };
        Self::new(payload, network)
    }

    fn decode_base58(addr: &str) -> Result<Self, ScriptError> {
        let (version, payload) = base58::check_decode(addr)
            .map_err(|e| ScriptError::invalid_address(addr, e.to_string()))?;
        if payload.len() != 20 {
            return Err(ScriptError::invalid_address(
                addr,
                format!("expected 20-byte hash, got {} bytes", payload.len()),
            ));
        }
        let (network, kind) = Network::from_base58_version(version).ok_or_else(|| {
            ScriptError::invalid_address(addr, format!("unknown version byte 0x{:02x}", version))
        })?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload);
        let payload = match kind {
            LegacyKind::PubkeyHash => AddressPayload::PubkeyHash(hash),
            LegacyKind::ScriptHash => AddressPayload::ScriptHash(hash),
        };
        Ok(Address { address_string: addr.to_string(), payload, network })
    }

    fn decode_segwit(addr: &str, network: Network) -> Result<Self, ScriptError> {
        let (_hrp, version, program) =
            segwit::decode(addr).map_err(|e| ScriptError::invalid_address(addr, e.to_string()))?;
        Ok(Address {
            address_string: addr.to_ascii_lowercase(),
            payload: AddressPayload::Segwit { version: version.to_u8(), program },
            network,
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address_string)
    }
}

impl FromStr for Address {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_string(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address_string)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Network whose bech32 HRP prefixes `addr`, if any.
fn split_hrp(addr: &str) -> Option<Network> {
    let sep = addr.rfind('1')?;
    Network::from_hrp(&addr[..sep].to_ascii_lowercase())
}

fn encode_segwit(network: Network, version: u8, program: &[u8]) -> Result<String, ScriptError> {
    let hrp = Hrp::parse(network.bech32_hrp())
        .map_err(|e| ScriptError::InvalidScript(e.to_string()))?;
    let fe = Fe32::try_from(version).map_err(|e| {
        ScriptError::UnsupportedAddressType(format!("witness version {}: {}", version, e))
    })?;
    segwit::encode(hrp, fe, program)
        .map_err(|e| ScriptError::UnsupportedAddressType(e.to_string()))
}

// ---------------------------------------------------------------------------
// Codec entry points
// ---------------------------------------------------------------------------

/// Locking script for an address string on `network`.
///
/// Fails with `InvalidAddress` on a bad checksum, prefix, HRP, or length,
/// or when the address belongs to another network.
pub fn script_for(address: &str, network: Network) -> Result<Script, ScriptError> {
    Address::parse(address, network)?.locking_script()
}

/// Address whose locking script is `script` on `network`.
pub fn address_for(script: &Script, network: Network) -> Result<Address, ScriptError> {
    Address::from_script(script, network)
}
