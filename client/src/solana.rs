//! Off-ledger escrow client library (spec §4.C).
//!
//! Builds typed instructions against `taskrow_escrow`, derives escrow PDAs
//! the same way the on-ledger program does, submits transactions through
//! the dual-path [`TransactionRouter`], and decodes account state via
//! `taskrow_core::account`.

use std::str::FromStr;

use anchor_lang::{InstructionData, ToAccountMetas};
use solana_client::rpc_client::RpcClient;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use spl_associated_token_account::get_associated_token_address;
use taskrow_core::account::{decode_escrow, EscrowAccount, EscrowStatus};
use taskrow_core::journal::{JournalSink, TracingJournal, TransactionKind};
use taskrow_core::pda::ESCROW_SEED;
use taskrow_escrow::accounts as escrow_accounts;
use taskrow_escrow::instruction as escrow_instruction;
use taskrow_x402::XPaymentEnvelope;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::router::TransactionRouter;
use crate::Result;

/// Result of [`EscrowClient::check_escrow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowLookup {
    /// No account exists at the derived PDA.
    NotExists,
    /// Account exists, decoded.
    Exists(EscrowAccount),
}

/// Outcome of [`EscrowClient::initialize_escrow_via_gateway`].
#[derive(Debug, Clone)]
pub enum InitOutcome {
    /// A fresh escrow was created on-ledger.
    Created {
        /// Transaction signature.
        signature: Signature,
        /// Whether the optimizing gateway delivered the transaction.
        used_gateway: bool,
    },
    /// The escrow already existed in `Pending` status; sentinel per spec
    /// §4.C idempotent-init contract. Callers must not double-spend rent by
    /// resubmitting `initialize_escrow` with the same seeds.
    AlreadyExists,
}

/// Outcome of [`EscrowClient::resolve_payment_envelope`].
#[derive(Debug, Clone)]
pub enum ResolvedEscrow {
    /// The envelope's embedded transaction was submitted and confirmed.
    Submitted {
        /// The escrow PDA that now exists on-ledger.
        escrow_pda: Pubkey,
        /// Confirmed transaction signature.
        signature: Signature,
    },
    /// The escrow already existed with parameters matching the caller's
    /// expectations; nothing was submitted.
    AlreadySettled {
        /// The escrow PDA found already on-ledger.
        escrow_pda: Pubkey,
    },
}

/// Off-ledger escrow client.
pub struct EscrowClient {
    rpc: RpcClient,
    client_keypair: Keypair,
    escrow_program_id: Pubkey,
    mint: Pubkey,
    router: TransactionRouter,
}

impl EscrowClient {
    /// Builds a client against `rpc_url`/`escrow_program_id`/`mint`, signing
    /// as `client_keypair`. `gateway_url`, if set, is tried before falling
    /// back to direct RPC (spec §4.E.1).
    pub fn new(
        rpc_url: &str,
        escrow_program_id: Pubkey,
        mint: Pubkey,
        client_keypair: Keypair,
        gateway_url: Option<String>,
    ) -> Self {
        info!(%escrow_program_id, "using escrow program");
        Self {
            rpc: RpcClient::new(rpc_url.to_string()),
            client_keypair,
            escrow_program_id,
            mint,
            router: TransactionRouter::new(rpc_url, gateway_url, Box::new(TracingJournal)),
        }
    }

    /// Loads the client keypair from a file path, as the teacher's
    /// `SolanaAgent` does for its sender keypair.
    pub fn load_keypair(path: impl AsRef<std::path::Path>) -> Result<Keypair> {
        read_keypair_file(path.as_ref())
            .map_err(|e| ClientError::Keypair(format!("failed to load client keypair: {e}")))
    }

    /// Derives the escrow PDA for `(client, provider, task_hash)`.
    ///
    /// Pure: must be identical, byte-for-byte, to the on-ledger derivation
    /// (spec §4.B, property P1).
    pub fn derive_escrow_pda(&self, client: &Pubkey, provider: &Pubkey, task_hash: &[u8; 32]) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[ESCROW_SEED, client.as_ref(), provider.as_ref(), task_hash.as_ref()],
            &self.escrow_program_id,
        )
    }

    /// Reads the escrow account at `pda`, decoding status and fields.
    pub fn check_escrow(&self, pda: &Pubkey) -> Result<EscrowLookup> {
        match self.rpc.get_account_data(pda) {
            Ok(data) => {
                let escrow = decode_escrow(&data).map_err(ClientError::from)?;
                Ok(EscrowLookup::Exists(escrow))
            }
            Err(e) if is_account_not_found(&e) => Ok(EscrowLookup::NotExists),
            Err(e) => Err(ClientError::solana("check_escrow", e)),
        }
    }

    /// Initializes an escrow for `provider`, locking `amount` smallest units
    /// under `(service_id, task_data, nonce)`.
    ///
    /// Idempotent per spec §4.C / property P7: if the PDA already exists in
    /// `Pending`, returns [`InitOutcome::AlreadyExists`] without resubmitting.
    /// Any other existing status is a hard error — the caller must mint a
    /// fresh nonce rather than reuse these seeds.
    pub async fn initialize_escrow_via_gateway(
        &self,
        provider: Pubkey,
        amount: u64,
        service_id: String,
        task_hash: [u8; 32],
    ) -> Result<InitOutcome> {
        let client_pubkey = self.client_keypair.pubkey();
        let (escrow_pda, _bump) = self.derive_escrow_pda(&client_pubkey, &provider, &task_hash);

        match self.check_escrow(&escrow_pda)? {
            EscrowLookup::Exists(escrow) if escrow.status == EscrowStatus::Pending => {
                debug!(%escrow_pda, "escrow already exists in Pending, treating as idempotent init");
                return Ok(InitOutcome::AlreadyExists);
            }
            EscrowLookup::Exists(escrow) => {
                return Err(ClientError::Core(taskrow_core::EscrowError::wrong_status(
                    format!("escrow {escrow_pda} exists with status {}", escrow.status),
                )));
            }
            EscrowLookup::NotExists => {}
        }

        let client_token_account = get_associated_token_address(&client_pubkey, &self.mint);
        let escrow_token_account = get_associated_token_address(&escrow_pda, &self.mint);

        // ATA materialization: init_if_needed on the escrow's ATA is handled
        // on-ledger; we only need to confirm the client already has funds in
        // an ATA of the expected owner, never silently reusing a
        // differently-owned account.
        if let Ok(account) = self.rpc.get_token_account(&client_token_account) {
            if let Some(account) = account {
                if account.owner != client_pubkey.to_string() {
                    return Err(ClientError::AtaOwnerMismatch {
                        escrow: escrow_pda.to_string(),
                    });
                }
            }
        }

        let accounts = escrow_accounts::InitializeEscrow {
            client: client_pubkey,
            provider,
            mint: self.mint,
            escrow: escrow_pda,
            client_token_account,
            escrow_token_account,
            token_program: spl_token::ID,
            associated_token_program: spl_associated_token_account::ID,
            system_program: solana_sdk::system_program::ID,
        };

        let instruction = Instruction {
            program_id: self.escrow_program_id,
            accounts: accounts.to_account_metas(None),
            data: escrow_instruction::InitializeEscrow {
                amount,
                service_id: service_id.clone(),
                task_hash,
            }
            .data(),
        };

        let (signature, used_gateway) = self
            .router
            .submit(
                TransactionKind::InitEscrow,
                &[instruction],
                &self.client_keypair,
                &[&self.client_keypair],
                &escrow_pda.to_string(),
                &client_pubkey.to_string(),
                &provider.to_string(),
                amount,
            )
            .await?;

        info!(%escrow_pda, %signature, used_gateway, "initialize_escrow submitted");
        Ok(InitOutcome::Created { signature, used_gateway })
    }

    /// Submits the provider's proof hash for the escrow at `pda`.
    pub fn submit_proof_with_pda(
        &self,
        pda: Pubkey,
        provider_signer: &Keypair,
        proof_hash: [u8; 32],
    ) -> Result<Signature> {
        let accounts = escrow_accounts::SubmitProof {
            provider: provider_signer.pubkey(),
            escrow: pda,
        };

        let instruction = Instruction {
            program_id: self.escrow_program_id,
            accounts: accounts.to_account_metas(None),
            data: escrow_instruction::SubmitProof { proof_hash }.data(),
        };

        let recent_hash = self
            .rpc
            .get_latest_blockhash()
            .map_err(|e| ClientError::solana("submit_proof", e))?;

        let tx = solana_sdk::transaction::Transaction::new_signed_with_payer(
            &[instruction],
            Some(&provider_signer.pubkey()),
            &[provider_signer],
            recent_hash,
        );

        let signature = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .map_err(|e| ClientError::solana("submit_proof", e))?;

        info!(%pda, %signature, "proof submitted");
        Ok(signature)
    }

    /// Releases payment for the escrow at `pda` to its provider, via the
    /// dual-path router. The client (`self.client_keypair`) is always the
    /// release authority (spec §9 open question 2).
    pub async fn release_payment_via_gateway(
        &self,
        pda: Pubkey,
        provider: Pubkey,
    ) -> Result<(Signature, bool)> {
        let escrow = match self.check_escrow(&pda)? {
            EscrowLookup::Exists(escrow) => escrow,
            EscrowLookup::NotExists => {
                return Err(ClientError::Core(taskrow_core::EscrowError::bad_request(
                    "no escrow at this address",
                )))
            }
        };

        let escrow_token_account = get_associated_token_address(&pda, &self.mint);
        let provider_token_account = get_associated_token_address(&provider, &self.mint);

        let accounts = escrow_accounts::ReleasePayment {
            authority: self.client_keypair.pubkey(),
            escrow: pda,
            escrow_token_account,
            provider_token_account,
            token_program: spl_token::ID,
        };

        let instruction = Instruction {
            program_id: self.escrow_program_id,
            accounts: accounts.to_account_metas(None),
            data: escrow_instruction::ReleasePayment {}.data(),
        };

        self.router
            .submit(
                TransactionKind::ReleasePayment,
                &[instruction],
                &self.client_keypair,
                &[&self.client_keypair],
                &pda.to_string(),
                &self.client_keypair.pubkey().to_string(),
                &provider.to_string(),
                escrow.amount,
            )
            .await
    }

    /// Cancels the escrow at `pda`, refunding the client. Only valid while
    /// `status == Pending`.
    pub fn cancel_escrow(&self, pda: Pubkey) -> Result<Signature> {
        let client_pubkey = self.client_keypair.pubkey();
        let client_token_account = get_associated_token_address(&client_pubkey, &self.mint);
        let escrow_token_account = get_associated_token_address(&pda, &self.mint);

        let accounts = escrow_accounts::CancelEscrow {
            authority: client_pubkey,
            escrow: pda,
            escrow_token_account,
            client_token_account,
            token_program: spl_token::ID,
        };

        let instruction = Instruction {
            program_id: self.escrow_program_id,
            accounts: accounts.to_account_metas(None),
            data: escrow_instruction::CancelEscrow {}.data(),
        };

        let recent_hash = self
            .rpc
            .get_latest_blockhash()
            .map_err(|e| ClientError::solana("cancel_escrow", e))?;

        let tx = solana_sdk::transaction::Transaction::new_signed_with_payer(
            &[instruction],
            Some(&client_pubkey),
            &[&self.client_keypair],
            recent_hash,
        );

        let signature = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .map_err(|e| ClientError::solana("cancel_escrow", e))?;

        info!(%pda, %signature, "escrow cancelled");
        Ok(signature)
    }

    /// Resolves the escrow an x402 payment envelope points at (spec §4.D,
    /// provider-side item 4): if the escrow doesn't yet exist, submits the
    /// embedded transaction and waits for confirmation; if it already
    /// exists with the expected `(provider, amount)`, accepts it without
    /// resubmission. This is the resource-server half of the protocol, the
    /// counterpart to [`Self::initialize_escrow_via_gateway`] on the client
    /// side.
    pub async fn resolve_payment_envelope(
        &self,
        envelope: &XPaymentEnvelope,
        expected_provider: Pubkey,
        expected_min_amount: u64,
    ) -> Result<ResolvedEscrow> {
        let escrow_pda = Pubkey::from_str(&envelope.payload.escrow_pda)
            .map_err(|e| ClientError::Serialization(format!("invalid escrowPDA: {e}")))?;

        match self.check_escrow(&escrow_pda)? {
            EscrowLookup::Exists(escrow) => {
                let provider = Pubkey::new_from_array(escrow.provider);
                if provider != expected_provider || escrow.amount < expected_min_amount {
                    return Err(ClientError::Core(taskrow_core::EscrowError::bad_request(format!(
                        "escrow {escrow_pda} exists with unexpected provider/amount"
                    ))));
                }
                debug!(%escrow_pda, "escrow already on-ledger, accepting without resubmission");
                Ok(ResolvedEscrow::AlreadySettled { escrow_pda })
            }
            EscrowLookup::NotExists => {
                let signature =
                    self.submit_embedded_transaction(&envelope.payload.serialized_transaction)?;
                info!(%escrow_pda, %signature, "submitted client-embedded init transaction");
                Ok(ResolvedEscrow::Submitted { escrow_pda, signature })
            }
        }
    }

    /// Submits an already-signed, base64-encoded transaction as-is — the
    /// provider never re-signs a client-authorized transaction — confirming
    /// with bounded retries (spec §4.D: "wait for confirmation (bounded
    /// retries)").
    fn submit_embedded_transaction(&self, serialized_b64: &str) -> Result<Signature> {
        let tx =
            crate::router::decode_transaction(serialized_b64).map_err(ClientError::Serialization)?;

        const MAX_ATTEMPTS: u32 = 3;
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.rpc.send_and_confirm_transaction(&tx) {
                Ok(signature) => return Ok(signature),
                Err(e) => {
                    warn!(attempt, error = %e, "embedded transaction submission failed, retrying");
                    last_err = Some(e);
                }
            }
        }
        Err(ClientError::solana(
            "submit_embedded_transaction",
            last_err.expect("loop runs at least once"),
        ))
    }

    /// Parses a ledger address from its base58 string form.
    pub fn parse_pubkey(s: &str) -> Result<Pubkey> {
        Pubkey::from_str(s).map_err(ClientError::from)
    }

    /// The client's own address, i.e. the escrow authority for this client.
    pub fn signer_pubkey(&self) -> Pubkey {
        self.client_keypair.pubkey()
    }
}

fn is_account_not_found(err: &solana_client::client_error::ClientError) -> bool {
    err.to_string().contains("AccountNotFound") || err.to_string().contains("could not find account")
}
