//! Integration tests for the on-ledger escrow state machine, exercised
//! against a real (in-process) bank via `solana-program-test` rather than
//! unit-tested handler functions in isolation — this is the only way to
//! verify PDA seeds, CPI token transfers, and account constraints actually
//! hold end to end.

use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use solana_program_test::*;
use solana_sdk::instruction::Instruction;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;

use taskrow_escrow::accounts as escrow_accounts;
use taskrow_escrow::instruction as escrow_instruction;
use taskrow_escrow::state::{Escrow, EscrowStatus};

const DECIMALS: u8 = 6;
const AMOUNT: u64 = 8_000_000;

struct Fixture {
    banks_client: BanksClient,
    payer: Keypair,
    recent_blockhash: solana_sdk::hash::Hash,
    client: Keypair,
    provider: Keypair,
    mint: Pubkey,
    escrow_pda: Pubkey,
    bump: u8,
    task_hash: [u8; 32],
}

async fn setup(client_starting_balance: u64) -> Fixture {
    let program_id = taskrow_escrow::id();
    let program_test = ProgramTest::new("taskrow_escrow", program_id, processor!(taskrow_escrow::entry));
    let (mut banks_client, payer, recent_blockhash) = program_test.start().await;

    let client = Keypair::new();
    let provider = Keypair::new();

    fund(&mut banks_client, &payer, &client.pubkey(), 1_000_000_000, recent_blockhash).await;
    fund(&mut banks_client, &payer, &provider.pubkey(), 1_000_000_000, recent_blockhash).await;

    let mint = create_mint(&mut banks_client, &payer, recent_blockhash).await;
    let client_ata =
        create_ata_with_balance(&mut banks_client, &payer, &mint, &client.pubkey(), client_starting_balance, recent_blockhash)
            .await;
    let _ = client_ata;

    let task_hash = [7u8; 32];
    let (escrow_pda, bump) = Pubkey::find_program_address(
        &[b"escrow", client.pubkey().as_ref(), provider.pubkey().as_ref(), task_hash.as_ref()],
        &program_id,
    );

    Fixture {
        banks_client,
        payer,
        recent_blockhash,
        client,
        provider,
        mint,
        escrow_pda,
        bump,
        task_hash,
    }
}

async fn fund(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    to: &Pubkey,
    lamports: u64,
    recent_blockhash: solana_sdk::hash::Hash,
) {
    let tx = Transaction::new_signed_with_payer(
        &[system_instruction::transfer(&payer.pubkey(), to, lamports)],
        Some(&payer.pubkey()),
        &[payer],
        recent_blockhash,
    );
    banks_client.process_transaction(tx).await.unwrap();
}

async fn create_mint(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    recent_blockhash: solana_sdk::hash::Hash,
) -> Pubkey {
    let mint = Keypair::new();
    let rent = banks_client.get_rent().await.unwrap();
    let space = spl_token::state::Mint::LEN;
    let lamports = rent.minimum_balance(space);

    let tx = Transaction::new_signed_with_payer(
        &[
            system_instruction::create_account(&payer.pubkey(), &mint.pubkey(), lamports, space as u64, &spl_token::id()),
            spl_token::instruction::initialize_mint2(&spl_token::id(), &mint.pubkey(), &payer.pubkey(), None, DECIMALS)
                .unwrap(),
        ],
        Some(&payer.pubkey()),
        &[payer, &mint],
        recent_blockhash,
    );
    banks_client.process_transaction(tx).await.unwrap();
    mint.pubkey()
}

async fn create_ata_with_balance(
    banks_client: &mut BanksClient,
    payer: &Keypair,
    mint: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    recent_blockhash: solana_sdk::hash::Hash,
) -> Pubkey {
    let ata = get_associated_token_address(owner, mint);
    let mut instructions = vec![spl_associated_token_account::instruction::create_associated_token_account(
        &payer.pubkey(),
        owner,
        mint,
        &spl_token::id(),
    )];
    if amount > 0 {
        instructions.push(spl_token::instruction::mint_to(&spl_token::id(), mint, &ata, &payer.pubkey(), &[], amount).unwrap());
    }
    let tx = Transaction::new_signed_with_payer(&instructions, Some(&payer.pubkey()), &[payer], recent_blockhash);
    banks_client.process_transaction(tx).await.unwrap();
    ata
}

fn initialize_escrow_ix(fixture: &Fixture, client_token_account: Pubkey, escrow_token_account: Pubkey) -> Instruction {
    let accounts = escrow_accounts::InitializeEscrow {
        client: fixture.client.pubkey(),
        provider: fixture.provider.pubkey(),
        mint: fixture.mint,
        escrow: fixture.escrow_pda,
        client_token_account,
        escrow_token_account,
        token_program: spl_token::id(),
        associated_token_program: spl_associated_token_account::id(),
        system_program: solana_sdk::system_program::id(),
    };
    Instruction {
        program_id: taskrow_escrow::id(),
        accounts: accounts.to_account_metas(None),
        data: escrow_instruction::InitializeEscrow {
            amount: AMOUNT,
            service_id: "code-review".to_string(),
            task_hash: fixture.task_hash,
        }
        .data(),
    }
}

async fn read_escrow(banks_client: &mut BanksClient, pda: &Pubkey) -> Escrow {
    let account = banks_client.get_account(*pda).await.unwrap().expect("escrow account must exist");
    Escrow::try_deserialize(&mut account.data.as_slice()).unwrap()
}

#[tokio::test]
async fn happy_path_init_proof_release() {
    let mut fx = setup(AMOUNT).await;
    let client_ata = get_associated_token_address(&fx.client.pubkey(), &fx.mint);
    let escrow_ata = get_associated_token_address(&fx.escrow_pda, &fx.mint);
    let provider_ata = create_ata_with_balance(&mut fx.banks_client, &fx.payer, &fx.mint, &fx.provider.pubkey(), 0, fx.recent_blockhash).await;

    let init_ix = initialize_escrow_ix(&fx, client_ata, escrow_ata);
    let tx = Transaction::new_signed_with_payer(&[init_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    let escrow = read_escrow(&mut fx.banks_client, &fx.escrow_pda).await;
    assert_eq!(escrow.status, EscrowStatus::Pending);
    assert_eq!(escrow.amount, AMOUNT);
    assert_eq!(escrow.proof_hash, None);
    assert_eq!(escrow.bump, fx.bump);

    let proof_hash = [9u8; 32];
    let submit_accounts = escrow_accounts::SubmitProof { provider: fx.provider.pubkey(), escrow: fx.escrow_pda };
    let submit_ix = Instruction {
        program_id: taskrow_escrow::id(),
        accounts: submit_accounts.to_account_metas(None),
        data: escrow_instruction::SubmitProof { proof_hash }.data(),
    };
    let tx = Transaction::new_signed_with_payer(&[submit_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.provider], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    let escrow = read_escrow(&mut fx.banks_client, &fx.escrow_pda).await;
    assert_eq!(escrow.status, EscrowStatus::ProofSubmitted);
    assert_eq!(escrow.proof_hash, Some(proof_hash));

    let release_accounts = escrow_accounts::ReleasePayment {
        authority: fx.client.pubkey(),
        escrow: fx.escrow_pda,
        escrow_token_account: escrow_ata,
        provider_token_account: provider_ata,
        token_program: spl_token::id(),
    };
    let release_ix = Instruction {
        program_id: taskrow_escrow::id(),
        accounts: release_accounts.to_account_metas(None),
        data: escrow_instruction::ReleasePayment {}.data(),
    };
    let tx = Transaction::new_signed_with_payer(&[release_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    let escrow = read_escrow(&mut fx.banks_client, &fx.escrow_pda).await;
    assert_eq!(escrow.status, EscrowStatus::Completed);

    let provider_account = fx.banks_client.get_account(provider_ata).await.unwrap().unwrap();
    let provider_token = spl_token::state::Account::unpack(&provider_account.data).unwrap();
    assert_eq!(provider_token.amount, AMOUNT);

    let escrow_account = fx.banks_client.get_account(escrow_ata).await.unwrap().unwrap();
    let escrow_token = spl_token::state::Account::unpack(&escrow_account.data).unwrap();
    assert_eq!(escrow_token.amount, 0, "escrow token account must be drained on completion (I4)");
}

#[tokio::test]
async fn cancel_refunds_client_and_blocks_later_proof() {
    let mut fx = setup(AMOUNT).await;
    let client_ata = get_associated_token_address(&fx.client.pubkey(), &fx.mint);
    let escrow_ata = get_associated_token_address(&fx.escrow_pda, &fx.mint);

    let init_ix = initialize_escrow_ix(&fx, client_ata, escrow_ata);
    let tx = Transaction::new_signed_with_payer(&[init_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    let cancel_accounts = escrow_accounts::CancelEscrow {
        authority: fx.client.pubkey(),
        escrow: fx.escrow_pda,
        escrow_token_account: escrow_ata,
        client_token_account: client_ata,
        token_program: spl_token::id(),
    };
    let cancel_ix = Instruction {
        program_id: taskrow_escrow::id(),
        accounts: cancel_accounts.to_account_metas(None),
        data: escrow_instruction::CancelEscrow {}.data(),
    };
    let tx = Transaction::new_signed_with_payer(&[cancel_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    let escrow = read_escrow(&mut fx.banks_client, &fx.escrow_pda).await;
    assert_eq!(escrow.status, EscrowStatus::Cancelled);

    let client_account = fx.banks_client.get_account(client_ata).await.unwrap().unwrap();
    let client_token = spl_token::state::Account::unpack(&client_account.data).unwrap();
    assert_eq!(client_token.amount, AMOUNT, "client must be refunded in full (P3)");

    // spec I2: Cancelled is terminal; a later submit_proof must be rejected.
    let submit_accounts = escrow_accounts::SubmitProof { provider: fx.provider.pubkey(), escrow: fx.escrow_pda };
    let submit_ix = Instruction {
        program_id: taskrow_escrow::id(),
        accounts: submit_accounts.to_account_metas(None),
        data: escrow_instruction::SubmitProof { proof_hash: [1u8; 32] }.data(),
    };
    let tx = Transaction::new_signed_with_payer(&[submit_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.provider], fx.recent_blockhash);
    let result = fx.banks_client.process_transaction(tx).await;
    assert!(result.is_err(), "submit_proof after cancellation must fail (WrongStatus)");
}

#[tokio::test]
async fn second_initialize_escrow_on_same_seeds_fails() {
    let mut fx = setup(AMOUNT * 2).await;
    let client_ata = get_associated_token_address(&fx.client.pubkey(), &fx.mint);
    let escrow_ata = get_associated_token_address(&fx.escrow_pda, &fx.mint);

    let init_ix = initialize_escrow_ix(&fx, client_ata, escrow_ata);
    let tx = Transaction::new_signed_with_payer(&[init_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    // property P7 / I5: a second init on identical (client, provider, task_hash)
    // seeds must not succeed — the PDA already exists.
    let second_init_ix = initialize_escrow_ix(&fx, client_ata, escrow_ata);
    let tx = Transaction::new_signed_with_payer(&[second_init_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    let result = fx.banks_client.process_transaction(tx).await;
    assert!(result.is_err(), "re-initializing the same escrow PDA must fail");
}

#[tokio::test]
async fn release_before_proof_is_rejected() {
    let mut fx = setup(AMOUNT).await;
    let client_ata = get_associated_token_address(&fx.client.pubkey(), &fx.mint);
    let escrow_ata = get_associated_token_address(&fx.escrow_pda, &fx.mint);
    let provider_ata = create_ata_with_balance(&mut fx.banks_client, &fx.payer, &fx.mint, &fx.provider.pubkey(), 0, fx.recent_blockhash).await;

    let init_ix = initialize_escrow_ix(&fx, client_ata, escrow_ata);
    let tx = Transaction::new_signed_with_payer(&[init_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    fx.banks_client.process_transaction(tx).await.unwrap();

    // spec scenario 3 / property P5 on the on-ledger side: release before
    // proof is submitted must be rejected (status is still Pending).
    let release_accounts = escrow_accounts::ReleasePayment {
        authority: fx.client.pubkey(),
        escrow: fx.escrow_pda,
        escrow_token_account: escrow_ata,
        provider_token_account: provider_ata,
        token_program: spl_token::id(),
    };
    let release_ix = Instruction {
        program_id: taskrow_escrow::id(),
        accounts: release_accounts.to_account_metas(None),
        data: escrow_instruction::ReleasePayment {}.data(),
    };
    let tx = Transaction::new_signed_with_payer(&[release_ix], Some(&fx.payer.pubkey()), &[&fx.payer, &fx.client], fx.recent_blockhash);
    let result = fx.banks_client.process_transaction(tx).await;
    assert!(result.is_err(), "release_payment before submit_proof must fail (WrongStatus)");
}
