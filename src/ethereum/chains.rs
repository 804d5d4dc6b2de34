use serde::Serialize;

/// A labeled public JSON-RPC endpoint. No API key required.
#[derive(Debug, Clone, Copy)]
pub struct RpcEndpoint {
    pub label: &'static str,
    pub url: &'static str,
}

/// The bundled endpoints for one chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainPresets {
    pub chain_id: u64,
    pub slug: &'static str,
    pub name: &'static str,
    pub endpoints: &'static [RpcEndpoint],
}

/// Free public RPC endpoints by chain.
pub const CHAIN_PRESETS: &[ChainPresets] = &[
    ChainPresets {
        chain_id: 1,
        slug: "ethereum",
        name: "Ethereum Mainnet",
        endpoints: &[
            RpcEndpoint { label: "Cloudflare", url: "https://cloudflare-eth.com" },
            RpcEndpoint { label: "PublicNode", url: "https://ethereum.publicnode.com" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/eth" },
            RpcEndpoint { label: "LlamaNodes", url: "https://eth.llamarpc.com" },
            RpcEndpoint { label: "dRPC", url: "https://eth.drpc.org" },
            RpcEndpoint { label: "BlockPI", url: "https://ethereum.public.blockpi.network/v1/rpc/public" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/eth" },
            RpcEndpoint { label: "Flashbots (fast)", url: "https://rpc.flashbots.net" },
            RpcEndpoint { label: "MEV Blocker", url: "https://rpc.mevblocker.io" },
        ],
    },
    ChainPresets {
        chain_id: 137,
        slug: "polygon",
        name: "Polygon",
        endpoints: &[
            RpcEndpoint { label: "Polygon RPC", url: "https://polygon-rpc.com" },
            RpcEndpoint { label: "dRPC", url: "https://polygon.drpc.org" },
            RpcEndpoint { label: "PublicNode", url: "https://polygon-bor-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/polygon" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/matic" },
        ],
    },
    ChainPresets {
        chain_id: 56,
        slug: "bsc",
        name: "BNB Smart Chain (BSC)",
        endpoints: &[
            RpcEndpoint { label: "BNB Chain Official", url: "https://bsc-dataseed.bnbchain.org" },
            RpcEndpoint { label: "PublicNode", url: "https://bsc-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/bsc" },
            RpcEndpoint { label: "dRPC", url: "https://bsc.drpc.org" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/bnb" },
        ],
    },
    ChainPresets {
        chain_id: 42161,
        slug: "arbitrum",
        name: "Arbitrum One",
        endpoints: &[
            RpcEndpoint { label: "Arbitrum Official", url: "https://arb1.arbitrum.io/rpc" },
            RpcEndpoint { label: "PublicNode", url: "https://arbitrum-one-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/arbitrum" },
            RpcEndpoint { label: "dRPC", url: "https://arbitrum.drpc.org" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/arb" },
        ],
    },
    ChainPresets {
        chain_id: 8453,
        slug: "base",
        name: "Base",
        endpoints: &[
            RpcEndpoint { label: "Base Official", url: "https://mainnet.base.org" },
            RpcEndpoint { label: "PublicNode", url: "https://base-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/base" },
            RpcEndpoint { label: "dRPC", url: "https://base.drpc.org" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/base" },
        ],
    },
    ChainPresets {
        chain_id: 10,
        slug: "optimism",
        name: "Optimism",
        endpoints: &[
            RpcEndpoint { label: "Optimism Official", url: "https://mainnet.optimism.io" },
            RpcEndpoint { label: "PublicNode", url: "https://optimism-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/optimism" },
            RpcEndpoint { label: "dRPC", url: "https://optimism.drpc.org" },
            RpcEndpoint { label: "1RPC", url: "https://1rpc.io/op" },
        ],
    },
    ChainPresets {
        chain_id: 43114,
        slug: "avalanche",
        name: "Avalanche C-Chain",
        endpoints: &[
            RpcEndpoint { label: "Avalanche Official", url: "https://api.avax.network/ext/bc/C/rpc" },
            RpcEndpoint { label: "PublicNode", url: "https://avalanche-c-chain-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/avalanche" },
            RpcEndpoint { label: "dRPC", url: "https://avax.drpc.org" },
        ],
    },
    ChainPresets {
        chain_id: 250,
        slug: "fantom",
        name: "Fantom",
        endpoints: &[
            RpcEndpoint { label: "Fantom Official", url: "https://rpc.ftm.tools" },
            RpcEndpoint { label: "PublicNode", url: "https://fantom-rpc.publicnode.com" },
            RpcEndpoint { label: "Ankr", url: "https://rpc.ankr.com/fantom" },
        ],
    },
];

/// All bundled RPC URLs in one flat iterator.
pub fn preset_urls() -> impl Iterator<Item = &'static str> {
    CHAIN_PRESETS
        .iter()
        .flat_map(|chain| chain.endpoints.iter().map(|endpoint| endpoint.url))
}

/// Whether a URL is one of the bundled presets (as opposed to user-entered).
pub fn is_preset(url: &str) -> bool {
    preset_urls().any(|preset| preset == url)
}

pub fn find_chain(chain_id: u64) -> Option<&'static ChainPresets> {
    CHAIN_PRESETS.iter().find(|chain| chain.chain_id == chain_id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Minimal description of the chain a transaction is signed for, built from
/// the endpoint's reported chain id and the active RPC URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
}

impl ChainDescriptor {
    pub fn custom(id: u64, rpc_url: &str) -> Self {
        let name = find_chain(id)
            .map(|chain| chain.name.to_string())
            .unwrap_or_else(|| "Custom".to_string());
        Self {
            id,
            name,
            native_currency: NativeCurrency {
                name: "Ether".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_url: rpc_url.to_string(),
        }
    }
}
