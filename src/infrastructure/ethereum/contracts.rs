//! Solidity bindings for the deployed EnigmaDuel contracts
//!
//! Only the surface the client touches is declared. Enum-typed fields are
//! declared as `uint8` (identical ABI encoding) and mapped to domain enums
//! after decoding.
//!
//! The contract's build artifact (`data/build/EnigmaDuelABI.json`) is not
//! vendored here. Method signatures follow the deployment scripts. The only
//! field read from `EDTWithdrawn` is `_new_balance`; its full layout is
//! assumed, and a deployment that differs is handled by loading its ABI
//! through [`BalanceEvent`](super::BalanceEvent).

use alloy::sol;

sol! {
    /// EnigmaDuel proxy
    interface IEnigmaDuel {
        struct Balance {
            uint256 total;
            uint256 locked;
            uint256 available;
        }

        struct GameRoom {
            address duelist1;
            address duelist2;
            uint256 prizePool;
            uint8 status;
        }

        event EDTWithdrawn(address indexed _user, uint256 _amount, uint256 _new_balance);

        event GameFinished(
            uint8 status,
            uint256 fee,
            address duelist1,
            uint256 duelist1_received,
            address duelist2,
            uint256 duelist2_received
        );

        function depositEDT(uint256 _amount) external;
        function withdrawEDT(uint256 _amount) external;
        function getUserbalance(address _user) external view returns (Balance memory);
        function getGameRoom(bytes32 _gameRoomKey) external view returns (GameRoom memory);
        function getFEE() external view returns (uint256);
        function getDRAW_FEE() external view returns (uint256);
        function getEDT() external view returns (address);
    }

    /// EDT (ERC-20)
    interface IEDT {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}
