use super::dto::QuizSource;

const JSON_SCHEMA_BLOCK: &str = r#"{
  "questions": [
    {
      "question": "Question text here",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": "Correct answer here",
      "type": "single-choice"
    }
  ]
}
For multi-choice questions, "correctAnswer" is an array of the correct answers and "type" is "multi-choice"."#;

/// System prompt steering the model toward quiz generation for the given
/// source kind
pub fn system_prompt(source: QuizSource) -> &'static str {
    match source {
        QuizSource::Document => {
            "You are a specialized quiz generation assistant that creates high-quality quiz \
             questions based on the provided document content. Your goal is to test understanding \
             of the material while ensuring questions are clear, relevant, and varied in difficulty."
        }
        QuizSource::Prompt => {
            "You are a specialized quiz generation assistant that creates high-quality quiz \
             questions based on user prompts. You follow the user's instructions regarding topics, \
             difficulty, and style, if specified, while ensuring questions are educational, \
             engaging, and well-formatted. IMPORTANT: For each request, especially 'random topic' \
             requests, generate DIFFERENT questions on DIFFERENT topics each time. Never repeat \
             the same topic or question patterns across requests. If the user simply pastes a \
             block of text, create a high quality quiz from the text with varying difficulty levels."
        }
    }
}

/// User prompt embedding the validated question count, the content, and the
/// expected JSON response shape
pub fn user_prompt(question_count: u32, content: &str, source: QuizSource) -> String {
    match source {
        QuizSource::Document => format!(
            "- Generate {question_count} questions based on the following document content:\n\
             {content}\n\n\
             - Include a mix of single-choice (one correct answer) and multi-choice (multiple correct answers) questions.\n\
             - Ensure the questions are clear, relevant, and unambiguous.\n\
             - Each question should test understanding of key concepts in the material.\n\
             - Cover content from different sections of the material.\n\
             - If the input is too short, generate fewer questions proportionally.\n\
             - If definitions, dates, or key figures are present, include factual recall questions.\n\
             - Each multi-choice question must have multiple correct answers, not just one.\n\
             - DO NOT create yes/no questions. Only create single-choice or multi-choice questions.\n\n\
             Format each question as a JSON object with the following structure:\n\
             {JSON_SCHEMA_BLOCK}\n\
             Return ONLY valid JSON with no additional text."
        ),
        QuizSource::Prompt => {
            let mut prompt = format!(
                "I need you to create a quiz according to these instructions:\n\n{content}"
            );

            let lowered = content.to_lowercase();
            if lowered.contains("random topic") || lowered.contains("quiz me") {
                prompt.push_str(
                    "\nIMPORTANT: Choose a DIFFERENT random topic than what you've chosen before. \
                     Do not pick astronomy, planets, or space unless explicitly requested. Vary \
                     between technology, history, science, literature, geography, sports, or other \
                     interesting domains. Each request should produce questions from a completely \
                     different domain.",
                );
            }

            prompt.push_str(&format!(
                "\n\nPlease generate {question_count} questions, using only single-choice or \
                 multi-choice question types.\n\n\
                 Format the questions in this JSON structure:\n\
                 {JSON_SCHEMA_BLOCK}\n\n\
                 Important requirements:\n\
                 - Follow the user's instructions regarding topics, difficulty level, and style. \
                 Where difficulty level is not specified, generate questions varying in difficulty.\n\
                 - Do not generate the same questions for the same prompts. Randomise and vary \
                 questions as much as possible even if the prompts are similar.\n\
                 - Ensure correct answers are accurate and unambiguous.\n\
                 - For multiple-choice questions, include plausible distractors.\n\
                 - Each multi-choice question should have at least two correct answers listed in \
                 the \"correctAnswer\" array.\n\
                 - DO NOT create yes/no questions. Only create single-choice or multi-choice questions.\n\
                 - Return ONLY valid JSON with no additional text."
            ));

            prompt
        }
    }
}
