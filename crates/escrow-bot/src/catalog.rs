use escrow_types::models::Network;

/// Display details and the receiving wallet for one payment network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub name: &'static str,
    pub icon: &'static str,
    pub gas_fee: &'static str,
    pub speed: &'static str,
    pub security: &'static str,
    pub explorer: &'static str,
    pub wallet: &'static str,
}

pub fn network_info(network: Network) -> NetworkInfo {
    match network {
        Network::Bep20 => NetworkInfo {
            name: "Binance Smart Chain",
            icon: "🟡",
            gas_fee: "$0.15",
            speed: "~3s",
            security: "🔒 High",
            explorer: "https://bscscan.com",
            wallet: "0x7646090a2ff41339918505040367b592d0bea9e0",
        },
        Network::Erc20 => NetworkInfo {
            name: "Ethereum",
            icon: "🔷",
            gas_fee: "$5-15",
            speed: "~15s",
            security: "🔒 Very High",
            explorer: "https://etherscan.io",
            wallet: "0x00cd23325e916ae47a93b50df1dbf420f50fbd70",
        },
        Network::Optimism => NetworkInfo {
            name: "Optimism",
            icon: "🔴",
            gas_fee: "$0.3-1",
            speed: "~2s",
            security: "🔒 High",
            explorer: "https://optimistic.etherscan.io",
            wallet: "0xcab27f050fbe0c011b6b4fb4247b706d1b60dc48",
        },
        Network::Arbitrum => NetworkInfo {
            name: "Arbitrum",
            icon: "🔵",
            gas_fee: "$0.1-0.5",
            speed: "~1s",
            security: "🔒 High",
            explorer: "https://arbiscan.io",
            wallet: "0x79e52eb60ea00cbe2df7afe541554d16e6825a51",
        },
    }
}

impl NetworkInfo {
    /// Selection button label, e.g. `🔵 ARBITRUM • ⚡️ ~1s • 💰 $0.1-0.5`.
    pub fn button_label(&self, network: Network) -> String {
        let speed_icon = if self.speed.contains("1s") { "⚡️" } else { "🚀" };
        format!(
            "{} {} • {} {} • 💰 {}",
            self.icon,
            network.as_str(),
            speed_icon,
            self.speed,
            self.gas_fee
        )
    }
}
