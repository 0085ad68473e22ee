use clap::{Args, Parser, Subcommand};
use shared::types::NodeConfig;
use shared::{Hash256, KeyPair};
use std::time::Duration;
use tracing::{info, Level};
use vintem_core::{peer_channel, validate_block, BlockBuilder, Chain};
use vintem_protocol::{Account, Address, FundsTx, Parameters, Transaction};

mod node;
use node::Node;

#[derive(Parser)]
#[command(name = "vintem")]
#[command(about = "Vintém - Proof-of-Work Miner Node")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a local mining demonstration (no network)
    Demo,
    /// Start the miner node
    StartNode(StartNodeArgs),
    /// Display version information
    Version,
}

#[derive(Args)]
struct StartNodeArgs {
    /// Disable mining (validate-only node)
    #[arg(long)]
    no_mine: bool,

    /// Target difficulty in leading zero bits
    #[arg(long, default_value = "12")]
    difficulty: u8,

    /// Channel capacity towards the network layer
    #[arg(long, default_value = "1024")]
    channel_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> shared::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Demo) | None => demo_mining(),
        Some(Commands::StartNode(args)) => start_node(args),
        Some(Commands::Version) => {
            show_version();
            Ok(())
        }
    }
}

fn start_node(args: &StartNodeArgs) -> shared::Result<()> {
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("⛏️ Starting Vintém miner node");

    let chain = Chain::new(Parameters::default(), args.difficulty);

    // a conta do próprio nó recebe taxas e recompensas
    let miner_keys = KeyPair::generate()?;
    let miner_account = Account::new(Address::from_bytes(*miner_keys.public_key.as_bytes()));
    chain.register_account(miner_account);
    info!(beneficiary = %miner_account.id(), "Beneficiary account registered");

    let config = NodeConfig {
        channel_capacity: args.channel_capacity,
        ..NodeConfig::default()
    };

    let (node, _network_side) = Node::new(chain, miner_account.id(), &config);
    info!("🔗 Node wired to the network contract channels");

    // bloqueia até os canais fecharem
    node.run(!args.no_mine);
    Ok(())
}

fn show_version() {
    println!("🪙 Vintém v0.1.0");
    println!("Proof-of-Work miner core");
    println!();
    println!("Features:");
    println!("  ✅ Block building over a shadow state");
    println!("  ✅ SHA3-256 proof-of-work with cooperative abort");
    println!("  ✅ Chain reorganization with strict-order rollback");
    println!("  ✅ ECDSA P-256 transaction signatures");
}

fn demo_mining() -> shared::Result<()> {
    println!("🪙 Vintém - demonstração local de mineração");
    println!("===========================================");

    // 1. Cadeia nova com dificuldade baixa para a demonstração
    println!("1. Criando a cadeia...");
    let difficulty = 8;
    let chain = Chain::new(Parameters::default(), difficulty);
    let (peers, _endpoint) = peer_channel(8, Duration::from_secs(1));
    println!("   ✅ Gênese confirmado, dificuldade {difficulty} bits");

    // 2. Contas de gênese
    println!("\n2. Registrando contas de gênese...");
    let alice = KeyPair::generate()?;
    let mut alice_account = Account::new(Address::from_bytes(*alice.public_key.as_bytes()));
    alice_account.balance = 100;
    chain.register_account(alice_account);

    let bob = KeyPair::generate()?;
    let bob_account = Account::new(Address::from_bytes(*bob.public_key.as_bytes()));
    chain.register_account(bob_account);

    let miner = KeyPair::generate()?;
    let miner_account = Account::new(Address::from_bytes(*miner.public_key.as_bytes()));
    chain.register_account(miner_account);

    println!("   👩 Alice: {} (saldo 100)", alice_account.id());
    println!("   👨 Bob:   {} (saldo 0)", bob_account.id());
    println!("   ⛏️ Minerador: {}", miner_account.id());

    // 3. Transação assinada de Alice para Bob
    println!("\n3. Assinando FundsTx de 40 vinténs (taxa 1)...");
    let mut tx = FundsTx::new(40, 1, 0, alice_account.id(), bob_account.id());
    tx.sign(&alice)?;
    println!("   🔐 Hash: {}", tx.hash());

    // 4. Montagem e mineração
    println!("\n4. Montando e minerando o bloco...");
    let builder = BlockBuilder::new(&chain, miner_account.id());
    let mut block = builder.new_block(chain.tip());
    builder.add_tx(&mut block, Transaction::Funds(tx))?;

    let start_time = std::time::Instant::now();
    builder.finalize(&mut block)?;
    let mining_duration = start_time.elapsed();

    println!("   ⛏️ Bloco minerado em {:.2}s", mining_duration.as_secs_f64());
    println!("     - Hash: {}", block.hash);
    println!("     - Nonce: {}", hex::encode(block.nonce));
    println!("     - Zeros iniciais: {}", block.hash.leading_zeros());

    // 5. Validação local
    println!("\n5. Validando o bloco...");
    validate_block(&chain, &peers, block.clone())?;
    println!("   ✅ Bloco aceito; topo agora é {}", chain.tip());

    // 6. Estado final
    println!("\n6. Estado final:");
    let balance = |id: Hash256| {
        chain
            .storage()
            .get_account(id)
            .map_or(0, |account| account.balance)
    };
    println!("   👩 Alice: {} vinténs", balance(alice_account.id()));
    println!("   👨 Bob:   {} vinténs", balance(bob_account.id()));
    println!("   ⛏️ Minerador: {} vinténs", balance(miner_account.id()));

    let stats = chain.stats();
    println!(
        "\n📊 Estatísticas: {}",
        serde_json::to_string_pretty(&stats)
            .map_err(|e| shared::ChainError::SerializationError(e.to_string()))?
    );

    println!("\n🎉 Demonstração concluída!");
    Ok(())
}
