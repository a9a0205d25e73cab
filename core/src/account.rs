use crate::error::EscrowError;

/// Escrow lifecycle status, mirroring `programs/escrow::state::EscrowStatus`.
///
/// Variant order (and therefore wire tag) must stay in lockstep with the
/// on-ledger enum: `Pending=0, ProofSubmitted=1, Completed=2, Cancelled=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EscrowStatus {
    /// Funds locked, no proof submitted yet.
    Pending = 0,
    /// Provider has submitted a proof hash; release is now possible.
    ProofSubmitted = 1,
    /// Funds released to the provider. Terminal.
    Completed = 2,
    /// Funds refunded to the client. Terminal.
    Cancelled = 3,
}

impl EscrowStatus {
    fn from_tag(tag: u8) -> crate::Result<Self> {
        match tag {
            0 => Ok(Self::Pending),
            1 => Ok(Self::ProofSubmitted),
            2 => Ok(Self::Completed),
            3 => Ok(Self::Cancelled),
            other => Err(EscrowError::bad_request(format!(
                "unrecognized escrow status tag: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::ProofSubmitted => "proof_submitted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Off-ledger mirror of the on-ledger `Escrow` account (spec §3/§6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowAccount {
    /// Commissioning party, 32-byte ledger address.
    pub client: [u8; 32],
    /// Party entitled to payment, 32-byte ledger address.
    pub provider: [u8; 32],
    /// Locked amount, smallest token unit.
    pub amount: u64,
    /// Human identifier for the service invoked.
    pub service_id: String,
    /// Digest binding the semantic task.
    pub task_hash: [u8; 32],
    /// `SHA256(input_hash || output_hash)` once submitted.
    pub proof_hash: Option<[u8; 32]>,
    /// Current lifecycle state.
    pub status: EscrowStatus,
    /// Wall-clock creation time. Advisory only, not authoritative.
    pub created_at: i64,
    /// PDA bump seed.
    pub bump: u8,
}

/// Decodes the raw bytes of an `Escrow` account, skipping the leading 8-byte
/// Anchor account discriminator.
///
/// Decoding is sequential (Borsh-style: fixed-width ints, a 4-byte
/// length-prefixed UTF-8 string, and a 1-byte tag for `Option`/enum values)
/// rather than a literal fixed-offset slice map. A literal fixed-offset map
/// would be wrong whenever `proof_hash` is `None`, since Borsh writes only
/// the 1-byte `None` tag and nothing else for that field; sequential
/// decoding stays correct for every account state while still reading the
/// fields in the exact order documented in spec §6.
pub fn decode_escrow(data: &[u8]) -> crate::Result<EscrowAccount> {
    let mut cursor = Cursor::new(data);
    cursor.skip(8)?; // account discriminator

    let client = cursor.read_array::<32>()?;
    let provider = cursor.read_array::<32>()?;
    let amount = cursor.read_u64()?;
    let service_id = cursor.read_string()?;
    let task_hash = cursor.read_array::<32>()?;
    let proof_hash = cursor.read_option_array::<32>()?;
    let status = EscrowStatus::from_tag(cursor.read_u8()?)?;
    let created_at = cursor.read_i64()?;
    let bump = cursor.read_u8()?;

    Ok(EscrowAccount {
        client,
        provider,
        amount,
        service_id,
        task_hash,
        proof_hash,
        status,
        created_at,
        bump,
    })
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> crate::Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or_else(|| {
            EscrowError::bad_request("escrow account buffer offset overflow")
        })?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| EscrowError::bad_request("escrow account buffer too short"))?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> crate::Result<()> {
        self.take(len).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> crate::Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn read_u8(&mut self) -> crate::Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u64(&mut self) -> crate::Result<u64> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }

    fn read_i64(&mut self) -> crate::Result<i64> {
        Ok(i64::from_le_bytes(self.read_array::<8>()?))
    }

    fn read_u32(&mut self) -> crate::Result<u32> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    fn read_string(&mut self) -> crate::Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| EscrowError::bad_request(format!("invalid utf8 in service_id: {e}")))
    }

    fn read_option_array<const N: usize>(&mut self) -> crate::Result<Option<[u8; N]>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.read_array::<N>()?)),
            other => Err(EscrowError::bad_request(format!(
                "unrecognized option tag: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_sample(proof_hash: Option<[u8; 32]>, status: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 8]; // discriminator
        buf.extend_from_slice(&[1u8; 32]); // client
        buf.extend_from_slice(&[2u8; 32]); // provider
        buf.extend_from_slice(&42u64.to_le_bytes()); // amount
        let service_id = b"analyze";
        buf.extend_from_slice(&(service_id.len() as u32).to_le_bytes());
        buf.extend_from_slice(service_id);
        buf.extend_from_slice(&[3u8; 32]); // task_hash
        match proof_hash {
            None => buf.push(0),
            Some(h) => {
                buf.push(1);
                buf.extend_from_slice(&h);
            }
        }
        buf.push(status);
        buf.extend_from_slice(&1_700_000_000i64.to_le_bytes());
        buf.push(255);
        buf
    }

    #[test]
    fn decodes_pending_without_proof() {
        let data = encode_sample(None, 0);
        let escrow = decode_escrow(&data).unwrap();
        assert_eq!(escrow.amount, 42);
        assert_eq!(escrow.service_id, "analyze");
        assert_eq!(escrow.proof_hash, None);
        assert_eq!(escrow.status, EscrowStatus::Pending);
        assert_eq!(escrow.bump, 255);
    }

    #[test]
    fn decodes_proof_submitted() {
        let data = encode_sample(Some([9u8; 32]), 1);
        let escrow = decode_escrow(&data).unwrap();
        assert_eq!(escrow.proof_hash, Some([9u8; 32]));
        assert_eq!(escrow.status, EscrowStatus::ProofSubmitted);
    }

    #[test]
    fn rejects_truncated_buffer() {
        let data = encode_sample(None, 0);
        assert!(decode_escrow(&data[..10]).is_err());
    }
}
