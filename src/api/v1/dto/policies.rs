/*
 * Responsibility
 * - /policies の request / response DTO
 * - domain 型 (PolicyRule) との変換
 */
use serde::{Deserialize, Serialize};

use crate::services::policy::{PolicyRule, RuleError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyRuleDto {
    pub role: String,
    pub resource: String,
    pub action: String,
}

impl From<&PolicyRule> for PolicyRuleDto {
    fn from(rule: &PolicyRule) -> Self {
        Self {
            role: rule.role().to_string(),
            resource: rule.resource().to_string(),
            action: rule.action().to_string(),
        }
    }
}

impl TryFrom<PolicyRuleDto> for PolicyRule {
    type Error = RuleError;

    fn try_from(dto: PolicyRuleDto) -> Result<Self, Self::Error> {
        PolicyRule::new(&dto.role, &dto.resource, &dto.action)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddPoliciesRequest {
    pub rules: Vec<PolicyRuleDto>,
}

#[derive(Debug, Serialize)]
pub struct PolicyListResponse {
    pub rules: Vec<PolicyRuleDto>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct AddPoliciesResponse {
    pub added: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub total: usize,
}
