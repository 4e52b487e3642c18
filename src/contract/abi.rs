//! Solidity interface of the deployed randomness contract.

use alloy::sol;

sol! {
    /// Stored record of a verifiable number generation.
    #[derive(Debug, PartialEq, Eq)]
    struct RandomGeneration {
        uint64 result;
        uint64 min;
        uint64 max;
        address requester;
        uint256 timestamp;
        uint256 blockNumber;
    }

    /// Stored record of a verifiable item selection.
    #[derive(Debug, PartialEq, Eq)]
    struct RandomSelection {
        string result;
        string[] items;
        uint256 index;
        address requester;
        uint256 timestamp;
        uint256 blockNumber;
    }

    /// Stored record of a YOLO decision.
    #[derive(Debug, PartialEq, Eq)]
    struct YoloDecision {
        string decision;
        string advice;
        uint64 randomValue;
        address requester;
        uint256 timestamp;
        uint256 blockNumber;
    }

    /// Reverted when asked to select from an empty list.
    #[derive(Debug)]
    error EmptyItemArray();

    #[derive(Debug)]
    event RandomNumberGenerated(uint64 randomNumber, uint64 min, uint64 max);

    #[derive(Debug)]
    event RandomItemSelected(string item, uint256 index);

    #[derive(Debug)]
    event VerifiableRandomNumberGenerated(
        bytes32 indexed generationId,
        address indexed requester,
        uint64 randomNumber,
        uint64 min,
        uint64 max,
        uint256 blockNumber,
        uint256 timestamp
    );

    #[derive(Debug)]
    event VerifiableRandomItemSelected(
        bytes32 indexed selectionId,
        address indexed requester,
        string selectedItem,
        string[] items,
        uint256 index,
        uint256 blockNumber,
        uint256 timestamp
    );

    #[derive(Debug)]
    event YoloDecisionMade(
        bytes32 indexed decisionId,
        address indexed requester,
        string decision,
        string advice,
        uint64 randomValue,
        uint256 blockNumber,
        uint256 timestamp
    );

    function getRandomNumber(uint64 min, uint64 max) external view returns (uint64);
    function selectRandomItem(string[] items) external view returns (string);

    function generateVerifiableRandomNumber(uint64 min, uint64 max) external returns (bytes32 generationId);
    function generateVerifiableRandomItem(string[] items) external returns (bytes32 selectionId);
    function makeYoloDecision() external returns (bytes32 decisionId);

    function getGenerationDetails(bytes32 generationId) external view returns (RandomGeneration);
    function getSelectionDetails(bytes32 selectionId) external view returns (RandomSelection);
    function getYoloDetails(bytes32 decisionId) external view returns (YoloDecision);
}
