//! Local secp256k1 signer for legacy (EIP-155) transactions.

use alloy_core::{
    primitives::{Address, Bytes, U256, keccak256},
    rlp::{Encodable, Header},
};
use anyhow::Context;
use k256::ecdsa::{RecoveryId, SigningKey};

/// A legacy transaction. `to: None` creates a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTx {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

impl LegacyTx {
    /// A zero-value contract creation.
    pub fn create(nonce: u64, gas_price: u128, gas_limit: u64, input: Bytes) -> Self {
        Self {
            nonce,
            gas_price,
            gas_limit,
            to: None,
            value: U256::ZERO,
            input,
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        match self.to {
            Some(to) => to.encode(out),
            // empty string marks a creation
            None => Bytes::new().encode(out),
        }
        self.value.encode(out);
        self.input.encode(out);
    }

    /// RLP payload hashed for signing: the fields followed by `chain_id, 0, 0`.
    fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        chain_id.encode(&mut fields);
        0u8.encode(&mut fields);
        0u8.encode(&mut fields);
        rlp_list(fields)
    }
}

fn rlp_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

/// Signs transactions with a private key held in memory.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Create a signer from a 32-byte private key (hex, with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, anyhow::Error> {
        let private_key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let private_key_bytes: [u8; 32] = hex::decode(private_key_hex)
            .context("Private key is not valid hex")?
            .try_into()
            .map_err(|_| anyhow::anyhow!("Private key must be exactly 32 bytes"))?;

        let key = SigningKey::from_bytes(&private_key_bytes.into())
            .map_err(|e| anyhow::anyhow!("Invalid secp256k1 private key: {}", e))?;

        // Uncompressed public key point: 0x04 prefix + 64 bytes
        let public_key_point = key.verifying_key().to_encoded_point(false);
        let hash = keccak256(&public_key_point.as_bytes()[1..]);
        let address = Address::from_slice(&hash[12..]);

        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a legacy transaction with EIP-155 replay protection.
    ///
    /// Returns the raw transaction bytes for `eth_sendRawTransaction`.
    pub fn sign_legacy(&self, tx: &LegacyTx, chain_id: u64) -> Result<Bytes, anyhow::Error> {
        let hash = keccak256(tx.signing_payload(chain_id));
        let (r, s, recovery_id) = self.sign_hash(hash.as_slice())?;

        let v = chain_id * 2 + 35 + u64::from(recovery_id.to_byte());

        let mut fields = Vec::new();
        tx.encode_fields(&mut fields);
        v.encode(&mut fields);
        r.encode(&mut fields);
        s.encode(&mut fields);

        Ok(rlp_list(fields).into())
    }

    fn sign_hash(&self, hash: &[u8]) -> Result<(U256, U256, RecoveryId), anyhow::Error> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash)
            .context("Failed to sign transaction")?;

        let bytes = signature.to_bytes();
        let r = U256::from_be_slice(&bytes[..32]);
        let s = U256::from_be_slice(&bytes[32..]);

        Ok((r, s, recovery_id))
    }
}

#[cfg(test)]
mod tests {
    use k256::ecdsa::{Signature, VerifyingKey};

    use super::*;

    /// First account of the default hardhat/anvil mnemonic.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn eip155_example() -> LegacyTx {
        LegacyTx {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x35)),
            value: U256::from(1_000_000_000_000_000_000u128),
            input: Bytes::new(),
        }
    }

    #[test]
    fn test_address_from_private_key() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );

        let unprefixed = LocalSigner::from_private_key(&DEV_KEY[2..]).unwrap();
        assert_eq!(unprefixed.address(), signer.address());
    }

    #[test]
    fn test_invalid_private_keys() {
        assert!(LocalSigner::from_private_key("0x1234").is_err());
        assert!(LocalSigner::from_private_key("not hex").is_err());
        assert!(LocalSigner::from_private_key(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_example();

        let payload = tx.signing_payload(1);
        assert_eq!(
            hex::encode(&payload),
            concat!(
                "ec098504a817c800825208943535353535353535353535353535353535353535",
                "880de0b6b3a764000080018080"
            )
        );
        assert_eq!(
            hex::encode(keccak256(&payload)),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_creation_payload_has_empty_to() {
        let tx = LegacyTx::create(0, 1, 21_000, Bytes::from(vec![0x60, 0x80]));
        let payload = tx.signing_payload(31337);

        // list header, nonce 0 (0x80), gas price 1, gas 21000 (0x825208), empty `to` (0x80)
        assert_eq!(hex::encode(&payload[1..7]), "800182520880");
    }

    #[test]
    fn test_signature_recovers_sender() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        let hash = keccak256(eip155_example().signing_payload(1));

        let (r, s, recovery_id) = signer.sign_hash(hash.as_slice()).unwrap();

        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&r.to_be_bytes::<32>());
        bytes[32..].copy_from_slice(&s.to_be_bytes::<32>());
        let signature = Signature::from_slice(&bytes).unwrap();

        let recovered =
            VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id).unwrap();
        assert_eq!(&recovered, signer.key.verifying_key());
    }

    #[test]
    fn test_signed_transaction_layout() {
        let signer = LocalSigner::from_private_key(DEV_KEY).unwrap();
        let raw = signer.sign_legacy(&eip155_example(), 1).unwrap();

        // long list header, then the unsigned fields verbatim
        assert_eq!(raw[0], 0xf8);
        assert_eq!(usize::from(raw[1]), raw.len() - 2);
        let mut fields = Vec::new();
        eip155_example().encode_fields(&mut fields);
        assert_eq!(&raw[2..2 + fields.len()], fields.as_slice());

        // v is 37 or 38 on mainnet
        let v = raw[2 + fields.len()];
        assert!(v == 37 || v == 38);
    }
}
