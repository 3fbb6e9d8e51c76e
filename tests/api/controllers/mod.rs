mod reader_activity;
