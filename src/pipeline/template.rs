use super::lexer;
use super::repair::branch_guard;
use super::steps::StageSteps;
use super::tree::{Block, Node};
use crate::config::RenderConfig;
use crate::project::StageKey;

/// Stage order used when a pipeline is generated without model output.
const TEMPLATE_ORDER: [StageKey; 5] = [
    StageKey::Lint,
    StageKey::Build,
    StageKey::Test,
    StageKey::Docker,
    StageKey::Deploy,
];

/// Renders one stage block per known stage, ready for assembly.
///
/// Deploy runs only on the default branch.
pub fn template_blocks(steps: &StageSteps, render: &RenderConfig) -> Vec<String> {
    let shell = render.platform.shell_step();

    TEMPLATE_ORDER
        .iter()
        .filter_map(|&key| {
            let name = key.stage_name();
            let commands = steps.get(name)?;

            let mut body = Vec::new();
            if key == StageKey::Deploy {
                body.push(Node::Block(Block::new(
                    "when",
                    vec![Node::Block(branch_guard(&render.default_branch))],
                )));
            }
            body.push(Node::Block(Block::new(
                "steps",
                commands
                    .iter()
                    .map(|c| Node::Statement(format!("{shell} {}", lexer::single_quoted(c))))
                    .collect(),
            )));

            let stage = Block::new(format!("stage({})", lexer::single_quoted(name)), body);
            Some(stage.render(0, render.indent).trim_end().to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_order_and_guard() {
        let mut steps = StageSteps::new();
        steps.insert("Build".to_string(), vec!["npm ci".to_string()]);
        steps.insert("Deploy".to_string(), vec!["npm run deploy".to_string()]);
        steps.insert("Lint".to_string(), vec!["npm run lint".to_string()]);

        let blocks = template_blocks(&steps, &RenderConfig::default());
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].starts_with("stage('Lint')"));
        assert!(blocks[1].starts_with("stage('Build')"));
        assert_eq!(
            blocks[2],
            "stage('Deploy') {\n    when {\n        expression { env.BRANCH_NAME == 'main' }\n    }\n    steps {\n        bat 'npm run deploy'\n    }\n}"
        );
    }

    #[test]
    fn test_template_without_steps_is_empty() {
        assert!(template_blocks(&StageSteps::new(), &RenderConfig::default()).is_empty());
    }
}
