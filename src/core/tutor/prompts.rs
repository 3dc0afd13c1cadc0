use crate::api::ChatMessage;

use super::questions::Question;

const EXPLAIN_SYSTEM_PROMPT: &str = "You are an excellent AI tutor who excels at explaining complex concepts in simple terms. Please explain the user's concept in clear and concise English, ensuring high school or college students can understand. Your explanation should include: 1) 📚 Basic definition 2) 💡 Simple explanation 3) 🎯 A vivid example. Keep your response within 300 words and use appropriate emojis to make it engaging and easy to follow. Make the explanation fun and memorable!";

const QUESTION_FORMAT_EXAMPLE: &str = r#"[
  {
    "id": "1",
    "question": "题目内容",
    "type": "multiple-choice",
    "options": ["选项A", "选项B", "选项C", "选项D"],
    "correctAnswer": "正确答案"
  },
  {
    "id": "2",
    "question": "题目内容",
    "type": "short-answer",
    "correctAnswer": "参考答案"
  }
]"#;

pub fn explain_messages(topic: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXPLAIN_SYSTEM_PROMPT),
        ChatMessage::user(format!("Please explain this concept: {topic}")),
    ]
}

pub fn question_messages(topic: &str) -> Vec<ChatMessage> {
    let system = format!(
        "你是一个AI题目生成器。根据用户学习的概念\"{topic}\"，生成2道练习题。请严格按照以下JSON格式回复，不要添加任何其他内容：\n\n{QUESTION_FORMAT_EXAMPLE}\n\n确保题目难度适中，能够检验学生对概念的理解。"
    );
    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!("为\"{topic}\"生成练习题")),
    ]
}

pub fn grading_messages(question: &Question, answer: &str) -> Vec<ChatMessage> {
    let system = format!(
        "你是一个AI评分老师。请评估学生的答案是否正确，并给出简洁的反馈。\n\n题目：{}\n正确答案：{}\n学生答案：{}\n\n请按照以下格式回复：\n正确性：[正确/部分正确/错误]\n反馈：[简短的解析和建议，50字以内]",
        question.question, question.correct_answer, answer
    );
    vec![
        ChatMessage::system(system),
        ChatMessage::user("请评估这个答案"),
    ]
}
