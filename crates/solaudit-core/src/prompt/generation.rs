use std::collections::BTreeMap;

use crate::prompt::templates::ContractTemplate;

const DOCUMENTATION_SCHEMA: &str = r#"The response should be ONLY a valid JSON object with the following structure:
{
  "name": "contract name",
  "description": "brief description of what the contract does",
  "version": "solidity version",
  "license": "license type",
  "functions": [
    {
      "name": "function name",
      "description": "what the function does",
      "params": [
        { "name": "parameter name", "type": "parameter type", "description": "parameter description" }
      ],
      "visibility": "public/private/internal/external"
    }
  ],
  "events": [
    {
      "name": "event name",
      "description": "what the event represents",
      "params": [
        { "name": "parameter name", "type": "parameter type", "indexed": boolean }
      ]
    }
  ],
  "variables": [
    {
      "name": "variable name",
      "type": "variable type",
      "visibility": "public/private/internal",
      "description": "what the variable represents"
    }
  ]
}"#;

/// Prompt asking for a structured documentation object.
pub fn documentation_prompt(source: &str) -> String {
    format!(
        "You are an expert Solidity smart contract analyzer. Analyze this smart contract and provide a structured documentation object.
{DOCUMENTATION_SCHEMA}

Contract code to analyze:
{source}

Important:
1. Return ONLY the JSON object, no additional text or backticks
2. Include all public and external functions
3. Document all events
4. Include all public state variables
5. Keep descriptions concise but informative
6. Ensure the JSON is valid and properly formatted
"
    )
}

/// Target framework of generated tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFramework {
    Hardhat,
    Foundry,
    Remix,
}

impl TestFramework {
    pub const ALL: [TestFramework; 3] = [
        TestFramework::Hardhat,
        TestFramework::Foundry,
        TestFramework::Remix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TestFramework::Hardhat => "Hardhat Tests",
            TestFramework::Foundry => "Foundry Tests",
            TestFramework::Remix => "Remix Manual Tests",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TestFramework::Hardhat => "Generate JavaScript/TypeScript tests using Hardhat and Chai",
            TestFramework::Foundry => "Generate Solidity-based tests using Foundry framework",
            TestFramework::Remix => {
                "Generate step-by-step manual testing instructions for Remix IDE"
            }
        }
    }

    /// Suggested file extension for the generated output.
    pub fn extension(&self) -> &'static str {
        match self {
            TestFramework::Hardhat => "ts",
            TestFramework::Foundry => "t.sol",
            TestFramework::Remix => "md",
        }
    }

    fn requirements(&self) -> &'static str {
        match self {
            TestFramework::Hardhat => {
                "- Use Hardhat and Chai with latest practices
- Include complete test setup with TypeScript
- Add proper describe/it blocks
- Include deployment scripts
- Add comprehensive assertions
- Include gas usage reporting
Return ONLY the complete test file code without any extra text."
            }
            TestFramework::Foundry => {
                "- Use Foundry's Solidity testing framework
- Include setUp() function
- Use forge std assertions
- Add fuzzing where appropriate
- Include proper test annotations
- Add gas optimization tests
Return ONLY the complete test file code without any extra text."
            }
            TestFramework::Remix => {
                "- Create step-by-step manual testing instructions
- Include specific input values to test
- Add expected outcomes for each step
- Include verification steps
- Add troubleshooting notes
- Include deployment instructions
Return a structured list of testing steps without any extra text."
            }
        }
    }
}

/// Prompt asking for a test suite in the given framework.
pub fn test_prompt(source: &str, framework: TestFramework) -> String {
    format!(
        "You are an expert in smart contract testing. Generate comprehensive test cases for the following smart contract:

Contract code:
{source}

Requirements:
- Test all main contract functions
- Include edge cases and error conditions
- Test access control
- Verify state changes
- Check event emissions
- Add gas optimization checks where relevant
Additional Requirements:
{}",
        framework.requirements()
    )
}

/// Prompt asking for a complete contract built from a template.
pub fn contract_prompt(
    template: &ContractTemplate,
    custom_features: Option<&str>,
    params: &BTreeMap<String, String>,
) -> String {
    let base_code = if template.base_code.is_empty() {
        "Create new contract"
    } else {
        template.base_code
    };
    let features = custom_features.map(str::trim).filter(|f| !f.is_empty());
    let params_json = serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string());

    let mut prompt = format!(
        "You are an expert Solidity developer. Generate a secure and optimized smart contract based on these requirements:

Template: {}
Base Code: {base_code}
Custom Features: {}
Parameters: {params_json}

Requirements:
1. Use Solidity version 0.8.19
2. Include comprehensive NatSpec documentation
3. All OpenZeppelin imports should use @openzeppelin/contracts
4. Add proper access control and safety checks
5. Include events for all important state changes
6. Add gas optimizations
7. Must be fully deployable
8. Include clear error messages
",
        template.name,
        features.unwrap_or("Standard features"),
    );

    if let Some(features) = features {
        prompt.push_str(&format!("\nAdditional Features to implement:\n{features}\n"));
    }

    prompt.push_str(
        "
Important:
- Keep the core functionality of the base template
- Add requested custom features seamlessly
- Ensure all OpenZeppelin imports are correct
- Add proper events for new features
- Include input validation
- Add clear error messages
- Follow security best practices

Return ONLY the complete contract code without any extra text or markdown.",
    );
    prompt
}
